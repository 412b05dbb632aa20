use crate::studio::catalog::LoadStatus;
use crate::studio::selection::{Stage, MAX_SPEED, MAX_TEXT_CHARS, MIN_SPEED};
use crate::studio::Session;

/// Render the studio page for one session.
pub fn render(session: &Session) -> String {
    let selection = session.selection();
    let submitter = session.submitter();
    let waiting = matches!(
        session.loader().status(),
        LoadStatus::Idle | LoadStatus::Loading
    );
    let refresh = waiting || submitter.is_converting();

    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    if refresh {
        html.push_str("<meta http-equiv=\"refresh\" content=\"1\">\n");
    }
    html.push_str("<title>Text to Speech</title>\n<link rel=\"stylesheet\" href=\"/static/style.css\">\n</head>\n<body>\n<main>\n<h1>Text to Speech</h1>\n");

    match session.loader().status() {
        LoadStatus::Loading => html.push_str("<p class=\"notice\">Loading voices...</p>\n"),
        LoadStatus::Failed(error) => {
            html.push_str(&format!(
                "<div class=\"error\">{}</div>\n<form method=\"post\" action=\"/catalog/reload\"><button type=\"submit\">Retry</button></form>\n",
                escape(error)
            ));
        }
        LoadStatus::Idle | LoadStatus::Ready => {}
    }

    html.push_str("<form method=\"post\" action=\"/\" class=\"studio\">\n");

    html.push_str(&format!(
        "<label for=\"text\">Text (up to {} characters)</label>\n<textarea id=\"text\" name=\"text\" rows=\"4\" maxlength=\"{}\" required>{}</textarea>\n",
        MAX_TEXT_CHARS,
        MAX_TEXT_CHARS,
        escape(selection.text())
    ));

    let controls_off = !session.controls_enabled() || session.catalog().is_empty();
    let stage = selection.stage();
    select(
        &mut html,
        "language",
        "Language",
        "Choose a language...",
        controls_off,
        session.languages().into_iter().map(|l| (l, l)),
        selection.language(),
    );
    select(
        &mut html,
        "gender",
        "Gender",
        "Choose a gender...",
        controls_off || stage == Stage::NoLanguage,
        session.available_genders().into_iter().map(|g| (g, g)),
        selection.gender(),
    );
    select(
        &mut html,
        "voice",
        "Voice",
        "Choose a voice...",
        controls_off || matches!(stage, Stage::NoLanguage | Stage::LanguageChosen),
        session
            .available_voices()
            .into_iter()
            .map(|v| (v.identifier.as_str(), v.display_name.as_str())),
        selection.voice(),
    );

    html.push_str(&format!(
        "<label for=\"speed\">Speed ({} - {})</label>\n<input type=\"number\" id=\"speed\" name=\"speed\" value=\"{}\" min=\"{}\" max=\"{:.1}\" step=\"0.1\">\n",
        MIN_SPEED,
        MAX_SPEED,
        selection.speed(),
        MIN_SPEED,
        MAX_SPEED
    ));

    html.push_str(&format!(
        "<button type=\"submit\" name=\"action\" value=\"convert\"{}>{}</button>\n</form>\n",
        disabled(!session.can_submit()),
        if submitter.is_converting() {
            "Converting..."
        } else {
            "Convert"
        }
    ));

    if let Some(error) = submitter.error() {
        html.push_str(&format!("<div class=\"error\">{}</div>\n", escape(error)));
    }

    if let Some(audio) = submitter.audio() {
        html.push_str(&format!(
            "<section class=\"result\">\n<h2>Result</h2>\n<audio controls src=\"{}\"></audio>\n<a class=\"download\" href=\"{}\">Download</a>\n</section>\n",
            audio.url(),
            audio.download_url()
        ));
    }

    html.push_str("<form method=\"post\" action=\"/session/end\"><button type=\"submit\" class=\"secondary\">Start over</button></form>\n");
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn select<'a>(
    html: &mut String,
    name: &str,
    label: &str,
    placeholder: &str,
    off: bool,
    options: impl Iterator<Item = (&'a str, &'a str)>,
    selected: Option<&str>,
) {
    html.push_str(&format!(
        "<label for=\"{name}\">{label}</label>\n<select id=\"{name}\" name=\"{name}\" onchange=\"this.form.submit()\"{}>\n<option value=\"\">{placeholder}</option>\n",
        disabled(off)
    ));
    for (value, text) in options {
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            escape(value),
            if selected == Some(value) { " selected" } else { "" },
            escape(text)
        ));
    }
    html.push_str("</select>\n");
}

fn disabled(off: bool) -> &'static str {
    if off {
        " disabled"
    } else {
        ""
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
