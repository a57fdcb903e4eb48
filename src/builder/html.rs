//! HTML rendering for a profile draft.

use crate::convo::model::ProfileDraft;

/// Escape text for interpolation into HTML.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// Render a standalone portfolio page from the draft.
pub fn render(draft: &ProfileDraft) -> String {
    let name = escape(draft.name.as_deref().filter(|s| !s.is_empty()).unwrap_or("Portfolio"));
    let role = escape(draft.role.as_deref().filter(|s| !s.is_empty()).unwrap_or("Professional"));

    let bio = match draft.bio.as_deref().filter(|s| !s.is_empty()) {
        Some(bio) => format!("<div class=\"bio\">{}</div>", escape(bio)),
        None => String::new(),
    };

    let skills = draft
        .skills
        .iter()
        .map(|s| format!("<span class=\"skill\">{}</span>", escape(s)))
        .collect::<Vec<_>>()
        .join("");

    let projects = draft
        .projects
        .iter()
        .map(|p| {
            let mut meta = String::new();
            if let Some(ref url) = p.url {
                meta.push_str(&format!(
                    "<div class=\"project-meta\"><a href=\"{}\" target=\"_blank\">View Project</a></div>",
                    escape(url)
                ));
            }
            if let Some(ref language) = p.language {
                meta.push_str(&format!(
                    "<div class=\"project-meta\">Language: {}</div>",
                    escape(language)
                ));
            }
            if let Some(stars) = p.stars.filter(|s| *s > 0) {
                meta.push_str(&format!("<div class=\"project-meta\">⭐ {stars} stars</div>"));
            }
            format!(
                "<div class=\"project\">\
                 <div class=\"project-title\">{}</div>\
                 <div class=\"project-desc\">{}</div>{meta}</div>",
                escape(&p.title),
                escape(&p.description),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>{name}'s Portfolio</title>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
      body {{ font-family: Arial, sans-serif; margin: 40px; line-height: 1.6; }}
      h1 {{ color: #333; border-bottom: 2px solid #007acc; }}
      h2 {{ color: #666; }}
      .bio {{ font-style: italic; margin: 20px 0; }}
      .skills {{ display: flex; flex-wrap: wrap; gap: 10px; }}
      .skill {{ background: #f0f8ff; padding: 5px 10px; border-radius: 5px; }}
      .projects {{ margin-top: 30px; }}
      .project {{ margin-bottom: 20px; padding: 15px; border-left: 3px solid #007acc; }}
      .project-title {{ font-weight: bold; color: #333; }}
      .project-desc {{ color: #666; margin-top: 5px; }}
      .project-meta {{ font-size: 0.9em; color: #999; margin-top: 5px; }}
    </style>
  </head>
  <body>
    <h1>{name}</h1>
    <h2>{role}</h2>
    {bio}
    <h3>Skills</h3>
    <div class="skills">{skills}</div>
    <div class="projects">
      <h3>Projects</h3>
      {projects}
    </div>
  </body>
</html>
"#
    )
}
