use maud::{html, Markup, DOCTYPE};

const REPORT_CSS: &str = r#"
body { font-family: system-ui, sans-serif; margin: 2rem; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ccc; padding: 0.4rem 0.6rem; text-align: left; vertical-align: top; }
th { background: #f4f4f4; }
tr.event-new td.event { color: #1a7f37; }
tr.event-updated td.event { color: #9a6700; }
tr.event-removed td.event { color: #cf222e; }
ul.changes { margin: 0.3rem 0 0; padding-left: 1rem; font-size: 0.85rem; color: #555; }
"#;

pub fn report_layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (maud::PreEscaped(REPORT_CSS)) }
            }
            body {
                h1 { (title) }
                (content)
            }
        }
    }
}
