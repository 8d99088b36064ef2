//! Static report rendering. Pages share the portal shell (sidebar,
//! header, glass styling); interactive behavior lives in static JS
//! assets that consume a typed JSON payload embedded in the page.

pub mod hero_page;
pub mod price_page;
pub mod signal_page;

use crate::error::Result;
use serde::Serialize;

pub const PORTAL_CSS: &str = include_str!("assets/portal.css");
pub const TABS_JS: &str = include_str!("assets/tabs.js");

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Serialize a payload for embedding inside a `<script>` block. `</`
/// must not appear verbatim or a `</script>` in the data would cut the
/// block short.
pub fn json_for_script<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(json.replace("</", "<\\/"))
}

pub struct PageShell<'a> {
    pub title: &'a str,
    pub heading: &'a str,
    pub subtitle: &'a str,
    pub nav_label: &'a str,
    pub nav_icon: &'a str,
    pub now_str: &'a str,
    pub sidebar_extra: String,
    pub body: String,
    pub scripts: String,
}

pub fn render_page(shell: &PageShell) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ko">
<head>
  <meta charset="UTF-8">
  <title>{title}</title>
  <script src="https://cdn.tailwindcss.com"></script>
  <link href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css" rel="stylesheet">
  <style>
{css}
  </style>
</head>
<body class="flex">
  <aside class="w-72 h-screen sticky top-0 sidebar hidden lg:flex flex-col p-8">
    <div class="flex items-center gap-4 mb-16 px-2">
      <div class="w-12 h-12 bg-[#002d72] rounded-2xl flex items-center justify-center text-white shadow-xl shadow-blue-900/20">
        <i class="fa-solid {nav_icon} text-xl"></i>
      </div>
      <div>
        <div class="text-xl font-black tracking-tighter italic">M-OS <span class="text-blue-600 font-extrabold">PRO</span></div>
        <div class="text-[9px] font-black uppercase tracking-[0.3em] text-slate-400">Marketing Portal</div>
      </div>
    </div>
    <nav class="space-y-4">
      <div class="p-4 rounded-2xl bg-white shadow-sm text-[#002d72] font-black flex items-center gap-4">
        <i class="fa-solid {nav_icon}"></i> <span>{nav_label}</span>
      </div>
    </nav>
{sidebar_extra}
  </aside>

  <main class="flex-1 p-8 md:p-16">
    <header class="flex flex-col md:flex-row md:items-center justify-between mb-10 gap-6">
      <div>
        <h1 class="text-5xl font-black tracking-tight text-slate-900 mb-4">{heading}</h1>
        <p class="text-slate-500 text-lg font-medium italic">{subtitle}</p>
      </div>
      <div class="glass-card px-6 py-4 flex items-center gap-4">
        <div class="flex h-3 w-3 relative">
          <span class="animate-ping absolute h-full w-full rounded-full bg-blue-400 opacity-75"></span>
          <span class="relative inline-flex rounded-full h-3 w-3 bg-blue-600"></span>
        </div>
        <span class="text-sm font-black text-slate-800 tracking-widest uppercase">{now}</span>
      </div>
    </header>
{body}
  </main>
{scripts}
</body>
</html>
"#,
        title = escape_html(shell.title),
        css = PORTAL_CSS,
        nav_icon = shell.nav_icon,
        nav_label = escape_html(shell.nav_label),
        sidebar_extra = shell.sidebar_extra,
        heading = escape_html(shell.heading),
        subtitle = escape_html(shell.subtitle),
        now = escape_html(shell.now_str),
        body = shell.body,
        scripts = shell.scripts,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Gore-Tex" & Co's</b>"#),
            "&lt;b&gt;&quot;Gore-Tex&quot; &amp; Co&#39;s&lt;/b&gt;"
        );
    }

    #[test]
    fn test_json_for_script_neutralizes_close_tags() {
        let payload = vec!["</script><script>alert(1)</script>".to_string()];
        let json = json_for_script(&payload).unwrap();
        assert!(!json.contains("</script>"));
        assert!(json.contains("<\\/script>"));
    }

    #[test]
    fn test_shell_renders_header_and_body() {
        let shell = PageShell {
            title: "M-OS | Test",
            heading: "Test Page",
            subtitle: "부제목",
            nav_label: "테스트",
            nav_icon: "fa-tags",
            now_str: "2026-02-01 10:00",
            sidebar_extra: String::new(),
            body: "<section id=\"probe\"></section>".to_string(),
            scripts: String::new(),
        };
        let html = render_page(&shell);
        assert!(html.contains("<title>M-OS | Test</title>"));
        assert!(html.contains("Test Page"));
        assert!(html.contains("id=\"probe\""));
        assert!(html.contains("2026-02-01 10:00"));
    }
}
