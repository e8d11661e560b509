use crate::dom::Element;

const STYLE: &str = r#"body { font-family: sans-serif; margin: 2em; }
#recentBuilds li { margin: 0.25em 0; }
#recentBuilds form { display: inline; margin-left: 0.5em; }
#curlCommand { background: #f4f4f4; padding: 0.5em; white-space: pre-wrap; }"#;

pub fn render_html(body: &Element) -> Vec<u8> {
    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Restabuild</title>
  <style>
{STYLE}
  </style>
</head>
{}
</html>
"####,
        body.to_html()
    );
    html.into_bytes()
}
