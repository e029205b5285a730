//! Page rendering. Every page is a pure function from a typed context to
//! markup, embedded in [`base`].

pub mod filters;
pub mod pages;
pub mod tags;

use filters::escape;
use tags::Sidebar;

/// The site layout: a `title` block, a `content` block and the sidebar.
pub fn base(title: &str, content: &str, sidebar: &Sidebar) -> String {
    format!(
        "<!DOCTYPE html>\n\
<html>\n\
<head>\n\
  <meta charset=\"utf-8\">\n\
  <title>{title}</title>\n\
  <link href=\"/static/css/blog.css\" rel=\"stylesheet\">\n\
</head>\n\
<body>\n\
  <div id=\"content\">\n\
{content}\n\
  </div>\n\
  <div id=\"sidebar\">\n\
{sidebar}\n\
  </div>\n\
</body>\n\
</html>\n",
        title = escape(title),
        sidebar = sidebar.render(),
    )
}
