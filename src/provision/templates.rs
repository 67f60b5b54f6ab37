// src/provision/templates.rs

//! Placeholder site content

/// Name of the generated index page
pub const INDEX_FILE: &str = "index.html";

/// Name of the generated stylesheet
pub const STYLESHEET_FILE: &str = "styles.css";

/// Fixed stylesheet shared by every placeholder site
pub const STYLES_CSS: &str = r#"*,
*::before,
*::after {
  box-sizing: border-box;
}

body {
  margin: 0;
  min-height: 100vh;
  display: flex;
  align-items: center;
  justify-content: center;
  font-family: system-ui, sans-serif;
  line-height: 1.5;
  color: #e8e6f0;
  background: #1b1530;
}

main {
  max-width: 40rem;
  padding: 2rem;
  text-align: center;
}

h1 {
  margin-top: 0;
  font-size: 2rem;
}

p {
  color: #b9b3cc;
}

code {
  padding: 0.1rem 0.3rem;
  border-radius: 0.25rem;
  background: #2c2448;
}
"#;

/// Index page for a site, with its name filled in
///
/// Site names are restricted to `[A-Za-z0-9._-]`, so they are safe to embed
/// in HTML unescaped.
pub fn index_html(name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <meta name="referrer" content="no-referrer">
  <title>{name}</title>
  <link rel="stylesheet" href="{STYLESHEET_FILE}">
</head>
<body>
  <main>
    <h1>{name}</h1>
    <p>This onion service is up and running.</p>
    <p>Replace <code>{INDEX_FILE}</code> in the web root to publish your own content.</p>
  </main>
</body>
</html>
"#
    )
}
