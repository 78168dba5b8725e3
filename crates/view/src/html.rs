//! HTML rendering of the playground page
//!
//! Plain server-side markup: every intent is a form posting to the web
//! shell's `/actions/*` routes, and the page refreshes itself while work is
//! in flight.

use std::fmt::{self, Display, Formatter};

use tts_playground_core::ConfigInputType;
use tts_playground_store::RunStatus;

use crate::projection::{
    CategoryGroup, ComposerView, FieldView, PlaygroundView, ResultCard, SidebarView,
};

/// Seconds between refreshes while a run or catalog load is pending
const REFRESH_SECONDS: u32 = 1;

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;background:#f6f7f9;color:#1d2330}\
.app-header{padding:12px 20px;background:#1d2330;color:#fff}\
.app-header p{margin:4px 0 0;opacity:.8}\
.error-banner{background:#fde2e2;color:#8a1010;padding:10px 20px}\
.env-warnings{background:#fff6dc;padding:8px 20px}\
.workspace-layout{display:grid;grid-template-columns:280px 1fr 320px;gap:16px;padding:16px}\
.model-row{display:flex;gap:6px;align-items:center}\
.model-row.active button.row-title{font-weight:700}\
.mini-warning{color:#a15c00}\
.results-grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(260px,1fr));gap:12px}\
.status-card{background:#fff;border-radius:8px;padding:10px}\
.pill{font-size:12px;padding:2px 8px;border-radius:10px;background:#e3e6ee}\
.pill.success{background:#d9f5df}.pill.error{background:#fde2e2}\
.pill.running,.pill.queued{background:#e0ecff}\
.error-text{color:#8a1010}\
textarea{width:100%;min-height:120px}\
.field{display:block;margin-bottom:10px}\
";

/// Escape text for use in element content and quoted attribute values
pub fn escape(input: &str) -> String {
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

/// Render the whole page
pub fn render_html(view: &PlaygroundView) -> String {
    Page(view).to_string()
}

struct Page<'a>(&'a PlaygroundView);

impl Display for Page<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let view = self.0;

        writeln!(f, "<!DOCTYPE html>")?;
        writeln!(f, "<html lang=\"en\">")?;
        writeln!(f, "<head>")?;
        writeln!(f, "<meta charset=\"utf-8\">")?;
        if view.pending || view.loading {
            writeln!(f, "<meta http-equiv=\"refresh\" content=\"{}\">", REFRESH_SECONDS)?;
        }
        writeln!(f, "<title>{}</title>", escape(view.title))?;
        writeln!(f, "<style>{}</style>", STYLE)?;
        writeln!(f, "</head>")?;
        writeln!(f, "<body data-revision=\"{}\">", view.revision)?;

        writeln!(f, "<header class=\"app-header\">")?;
        writeln!(f, "<h1>{}</h1>", escape(view.title))?;
        writeln!(f, "<p>{}</p>", escape(view.subtitle))?;
        writeln!(
            f,
            "<form method=\"post\" action=\"/actions/reload\"><button type=\"submit\">Reload catalog</button></form>"
        )?;
        writeln!(f, "</header>")?;

        if let Some(error) = &view.global_error {
            writeln!(f, "<div class=\"error-banner\" role=\"alert\">{}</div>", escape(error))?;
        }
        env_warnings(f, view)?;

        if view.loading {
            writeln!(f, "<p>Loading model catalog...</p>")?;
        } else {
            writeln!(f, "<main class=\"workspace-layout\">")?;
            browser(f, &view.browser)?;
            writeln!(f, "<section class=\"middle-column\">")?;
            composer(f, &view.composer)?;
            results(f, view)?;
            writeln!(f, "</section>")?;
            sidebar(f, view.sidebar.as_ref())?;
            writeln!(f, "</main>")?;
        }

        writeln!(f, "</body>")?;
        writeln!(f, "</html>")
    }
}

fn env_warnings(f: &mut Formatter<'_>, view: &PlaygroundView) -> fmt::Result {
    if view.env_warnings.is_empty() {
        return Ok(());
    }

    writeln!(f, "<section class=\"env-warnings\" aria-label=\"Environment warnings\">")?;
    writeln!(f, "<details>")?;
    writeln!(
        f,
        "<summary><strong>{} model(s) not configured.</strong> Expand for required env vars.</summary>",
        view.unconfigured_count()
    )?;
    writeln!(f, "<ul>")?;
    for warning in &view.env_warnings {
        writeln!(
            f,
            "<li>{}: {}</li>",
            escape(&warning.display_name),
            escape(&warning.message)
        )?;
    }
    writeln!(f, "</ul>")?;
    writeln!(f, "</details>")?;
    writeln!(f, "</section>")
}

fn browser(f: &mut Formatter<'_>, groups: &[CategoryGroup]) -> fmt::Result {
    writeln!(f, "<section class=\"models-column\">")?;
    writeln!(f, "<h2>Models</h2>")?;
    writeln!(f, "<p>Click a row to edit its config. The box controls batch runs.</p>")?;

    for group in groups {
        writeln!(
            f,
            "<section class=\"model-group\" aria-label=\"{0}\"><h3>{0}</h3><span>{1}</span>",
            escape(group.title),
            group.count
        )?;
        for provider in &group.providers {
            writeln!(f, "<div class=\"provider-group\">")?;
            writeln!(f, "<p class=\"provider-title\">{}</p>", escape(&provider.label))?;
            for row in &provider.rows {
                let id = escape(&row.model_id);
                let mut classes = String::from("model-row");
                if row.active {
                    classes.push_str(" active");
                }
                if !row.configured {
                    classes.push_str(" unconfigured");
                }

                writeln!(f, "<div class=\"{}\">", classes)?;
                writeln!(
                    f,
                    "<form method=\"post\" action=\"/actions/active\"><input type=\"hidden\" name=\"model_id\" value=\"{}\"><button type=\"submit\" class=\"row-title\">{}</button></form>",
                    id,
                    escape(&row.label)
                )?;
                writeln!(
                    f,
                    "<form method=\"post\" action=\"/actions/toggle\"><input type=\"hidden\" name=\"model_id\" value=\"{}\"><button type=\"submit\" aria-label=\"Select {}\" aria-pressed=\"{}\">{}</button></form>",
                    id,
                    escape(&row.display_name),
                    row.selected,
                    if row.selected { "[x]" } else { "[ ]" }
                )?;
                if !row.configured {
                    writeln!(f, "<small class=\"mini-warning\">Not configured</small>")?;
                }
                writeln!(f, "</div>")?;
            }
            writeln!(f, "</div>")?;
        }
        writeln!(f, "</section>")?;
    }

    writeln!(f, "</section>")
}

fn composer(f: &mut Formatter<'_>, composer: &ComposerView) -> fmt::Result {
    let disabled = if composer.can_speak { "" } else { " disabled" };

    writeln!(f, "<section class=\"composer\">")?;
    writeln!(f, "<h2>Input Text</h2>")?;
    writeln!(f, "<form method=\"post\" action=\"/actions/text\">")?;
    writeln!(
        f,
        "<textarea name=\"text\" placeholder=\"Type Tanglish or Tamil/English text here...\">{}</textarea>",
        escape(&composer.text)
    )?;
    writeln!(f, "<div class=\"action-row\">")?;
    writeln!(
        f,
        "<button type=\"submit\" formaction=\"/actions/speak\"{}>Speak</button>",
        disabled
    )?;
    writeln!(
        f,
        "<button type=\"submit\" formaction=\"/actions/speak-batch\" class=\"secondary\"{}>Speak on selected models</button>",
        disabled
    )?;
    writeln!(f, "<button type=\"submit\">Save text</button>")?;
    writeln!(f, "<span>{} selected</span>", composer.selected_count)?;
    writeln!(f, "</div>")?;
    writeln!(f, "</form>")?;
    writeln!(f, "</section>")
}

fn results(f: &mut Formatter<'_>, view: &PlaygroundView) -> fmt::Result {
    writeln!(f, "<section class=\"results\">")?;
    writeln!(f, "<h2>Model Outputs</h2>")?;
    if let Some(summary) = &view.last_batch_summary {
        writeln!(
            f,
            "<p class=\"batch-summary\">Last batch: {} total · {} succeeded · {} failed · {}ms</p>",
            summary.total, summary.success_count, summary.failure_count, summary.duration_ms
        )?;
    }
    writeln!(f, "<div class=\"results-grid\">")?;
    for card in &view.results {
        result_card(f, card)?;
    }
    writeln!(f, "</div>")?;
    writeln!(f, "</section>")
}

fn result_card(f: &mut Formatter<'_>, card: &ResultCard) -> fmt::Result {
    let status = card.status.as_str();

    writeln!(
        f,
        "<article class=\"status-card {}\" data-model-id=\"{}\">",
        status,
        escape(&card.model_id)
    )?;
    writeln!(
        f,
        "<header><div><p class=\"provider-chip\">{}</p><h4>{}</h4></div><span class=\"pill {}\">{}</span></header>",
        escape(&card.provider_label),
        escape(&card.model_label),
        status,
        status
    )?;
    writeln!(
        f,
        "<p class=\"card-meta\">Latency: {}ms · Streaming: {}</p>",
        card.latency_ms,
        if card.streaming_used { "yes" } else { "no" }
    )?;
    if let Some(src) = &card.audio_src {
        writeln!(f, "<audio controls src=\"{}\"></audio>", escape(src))?;
    }
    if let Some(error) = &card.error {
        writeln!(f, "<p class=\"error-text\">{}</p>", escape(error))?;
    } else if card.status == RunStatus::Running {
        writeln!(f, "<p class=\"card-progress\">Synthesizing...</p>")?;
    }
    writeln!(f, "</article>")
}

fn sidebar(f: &mut Formatter<'_>, sidebar: Option<&SidebarView>) -> fmt::Result {
    let Some(sidebar) = sidebar else {
        return writeln!(f, "<aside class=\"sidebar\">Select a model tab.</aside>");
    };

    writeln!(f, "<aside class=\"sidebar\">")?;
    writeln!(f, "<h2>{}</h2>", escape(&sidebar.model_label))?;
    writeln!(
        f,
        "<p class=\"meta\">Provider: {} · {}</p>",
        escape(&sidebar.provider_label),
        sidebar.category_label
    )?;

    if !sidebar.configured {
        writeln!(f, "<div class=\"warning-box\"><strong>Not configured</strong><ul>")?;
        for warning in &sidebar.warnings {
            writeln!(f, "<li>{}</li>", escape(warning))?;
        }
        writeln!(f, "</ul></div>")?;
    }

    writeln!(f, "<div class=\"field-list\">")?;
    for field in &sidebar.fields {
        config_field(f, &sidebar.model_id, field)?;
    }
    writeln!(f, "</div>")?;
    writeln!(f, "</aside>")
}

fn config_field(f: &mut Formatter<'_>, model_id: &str, field: &FieldView) -> fmt::Result {
    let id = escape(&format!("{}-{}", model_id, field.key));

    writeln!(f, "<form method=\"post\" action=\"/actions/config\" class=\"field\">")?;
    writeln!(
        f,
        "<input type=\"hidden\" name=\"model_id\" value=\"{}\"><input type=\"hidden\" name=\"key\" value=\"{}\"><input type=\"hidden\" name=\"input_type\" value=\"{}\">",
        escape(model_id),
        escape(&field.key),
        field.input_type.as_str()
    )?;
    writeln!(f, "<label for=\"{}\">{}</label>", id, escape(&field.label))?;

    let placeholder = escape(field.placeholder.as_deref().unwrap_or(""));
    match field.input_type {
        ConfigInputType::Textarea => writeln!(
            f,
            "<textarea id=\"{}\" name=\"value\" placeholder=\"{}\">{}</textarea>",
            id,
            placeholder,
            escape(&field.value.display_value())
        )?,
        ConfigInputType::Select => {
            writeln!(f, "<select id=\"{}\" name=\"value\">", id)?;
            let current = field.value.display_value();
            for option in &field.options {
                writeln!(
                    f,
                    "<option value=\"{}\"{}>{}</option>",
                    escape(&option.value),
                    if option.value == current { " selected" } else { "" },
                    escape(&option.label)
                )?;
            }
            writeln!(f, "</select>")?;
        }
        ConfigInputType::Slider | ConfigInputType::Number => {
            let kind = if field.input_type == ConfigInputType::Slider {
                "range"
            } else {
                "number"
            };
            let value = field.value.as_f64().unwrap_or(0.0);
            write!(
                f,
                "<input id=\"{}\" name=\"value\" type=\"{}\" value=\"{}\"",
                id, kind, value
            )?;
            bound(f, "min", field.min)?;
            bound(f, "max", field.max)?;
            bound(f, "step", field.step)?;
            writeln!(f, ">")?;
            if field.input_type == ConfigInputType::Slider {
                writeln!(f, "<span>{:.2}</span>", value)?;
            }
        }
        ConfigInputType::Checkbox => writeln!(
            f,
            "<input id=\"{}\" name=\"value\" type=\"checkbox\" value=\"true\"{}>",
            id,
            if field.value.is_truthy() { " checked" } else { "" }
        )?,
        ConfigInputType::Text => writeln!(
            f,
            "<input id=\"{}\" name=\"value\" type=\"text\" value=\"{}\" placeholder=\"{}\">",
            id,
            escape(&field.value.display_value()),
            placeholder
        )?,
    }

    if let Some(help) = &field.help_text {
        writeln!(f, "<small>{}</small>", escape(help))?;
    }
    writeln!(f, "<button type=\"submit\">Apply</button>")?;
    writeln!(f, "</form>")
}

fn bound(f: &mut Formatter<'_>, name: &str, value: Option<f64>) -> fmt::Result {
    match value {
        Some(v) => write!(f, " {}=\"{}\"", name, v),
        None => Ok(()),
    }
}
