//! HTML for the suspension and reactivation pages.

use crate::redirect::Notice;

/// Shown when the authority gives no project name.
pub const DEFAULT_PROJECT_NAME: &str = "This project";
/// Shown when the authority gives no suspension reason.
pub const DEFAULT_SUSPENDED_REASON: &str = "Suspended from the control panel";
/// Delay before the success page moves on.
pub const SUCCESS_REDIRECT_SECS: u32 = 3;

/// Escapes text for interpolation into HTML content and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Inputs of the suspension page.
#[derive(Debug, Clone, Default)]
pub struct SuspensionView<'a> {
    pub project_name: Option<&'a str>,
    pub reason: Option<&'a str>,
    pub notice: Option<Notice>,
    /// Where the reactivation form posts to.
    pub form_action: &'a str,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;background:#f4f5f7;color:#1f2933;\
display:flex;align-items:center;justify-content:center;min-height:100vh;margin:0}\
.card{background:#fff;border-radius:12px;box-shadow:0 8px 24px rgba(0,0,0,.08);\
padding:40px;max-width:480px;width:100%;text-align:center}\
.reason{background:#fff4e5;border-radius:8px;padding:12px;margin:20px 0}\
.error{color:#b42318}.success{color:#027a48}\
input{width:100%;padding:12px;border:1px solid #cbd2d9;border-radius:8px;box-sizing:border-box}\
button{margin-top:12px;width:100%;padding:12px;border:0;border-radius:8px;background:#2563eb;color:#fff}";

/// Renders the blocking page with the reactivation form.
pub fn render_suspension_page(view: &SuspensionView<'_>) -> String {
    let name = escape_html(non_blank(view.project_name).unwrap_or(DEFAULT_PROJECT_NAME));
    let reason = escape_html(non_blank(view.reason).unwrap_or(DEFAULT_SUSPENDED_REASON));
    let notice = match &view.notice {
        Some(Notice::Error(m)) => format!("<p class=\"error\">{}</p>", escape_html(m)),
        Some(Notice::Success(m)) => format!("<p class=\"success\">{}</p>", escape_html(m)),
        None => String::new(),
    };
    let action = escape_html(view.form_action);

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>Project suspended</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<div class=\"card\">\n\
<h1>{name} is suspended</h1>\n\
<div class=\"reason\"><strong>Reason:</strong> {reason}</div>\n\
{notice}\n\
<form method=\"POST\" action=\"{action}\">\n\
<input type=\"text\" name=\"activation_code\" placeholder=\"Enter the activation code\" required>\n\
<button type=\"submit\">Reactivate</button>\n\
</form>\n</div>\n</body>\n</html>\n"
    )
}

/// Renders the confirmation page that moves on to `target` after a short delay.
pub fn render_success_page(message: &str, target: &str) -> String {
    let message = escape_html(message);
    let target_attr = escape_html(target);
    // Double-quoted JS string literal; `<` escaped so `</script>` cannot close the tag.
    let target_js = target
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('<', "\\u003c");
    let delay = SUCCESS_REDIRECT_SECS;
    let delay_ms = SUCCESS_REDIRECT_SECS * 1000;

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta http-equiv=\"refresh\" content=\"{delay};url={target_attr}\">\n\
<title>Project reactivated</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<div class=\"card\">\n\
<h1 class=\"success\">{message}</h1>\n\
<p>Redirecting in {delay} seconds&hellip;</p>\n\
<p><a href=\"{target_attr}\">Continue</a></p>\n\
</div>\n<script>setTimeout(function(){{window.location.href=\"{target_js}\";}},{delay_ms});</script>\n\
</body>\n</html>\n"
    )
}
