//! HTML for the upload and result pages

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}\
textarea{width:100%;height:16rem;font-family:monospace}\
.row{margin:1rem 0}.error{color:#b00020}";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>WAV File Converter</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        STYLE, body
    )
}

fn upload_form() -> &'static str {
    "<h1>WAV File Converter</h1>\n\
     <p>Upload one or more WAV files to convert them while preserving:</p>\n\
     <ul>\n<li>Original sample rate</li>\n<li>Original bit depth</li>\n\
     <li>Original number of channels</li>\n<li>All audio samples (no data loss)</li>\n</ul>\n\
     <p>Supports PCM (8-bit to 32-bit), 32-bit float and 64-bit float formats.</p>\n\
     <form class=\"row\" action=\"/convert\" method=\"post\" enctype=\"multipart/form-data\">\n\
     <label>Input WAV Files <input type=\"file\" name=\"files\" accept=\".wav,audio/wav\" multiple></label>\n\
     <div class=\"row\"><button type=\"submit\">Convert Files</button></div>\n\
     </form>"
}

pub fn index() -> String {
    layout(upload_form())
}

/// Result page: report text plus `(href, label)` download links.
pub fn result(report: &str, downloads: &[(String, String)]) -> String {
    let mut body = String::from(upload_form());

    body.push_str("\n<div class=\"row\"><label>Conversion Info<br>\n<textarea readonly>");
    body.push_str(&escape_html(report));
    body.push_str("</textarea></label></div>\n");

    body.push_str("<div class=\"row\"><h2>Converted Files</h2>\n");
    if downloads.is_empty() {
        body.push_str("<p>No files were converted.</p>\n");
    } else {
        body.push_str("<ul>\n");
        for (href, label) in downloads {
            body.push_str(&format!(
                "<li><a href=\"{}\" download>{}</a></li>\n",
                escape_html(href),
                escape_html(label)
            ));
        }
        body.push_str("</ul>\n");
    }
    body.push_str("</div>");

    layout(&body)
}

pub fn error(message: &str) -> String {
    let body = format!(
        "{}\n<p class=\"row error\">{}</p>",
        upload_form(),
        escape_html(message)
    );
    layout(&body)
}
