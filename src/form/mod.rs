use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::dom::Control;

// bytes a browser's encodeURIComponent leaves alone: A-Z a-z 0-9 - _ . ! ~ * ' ( )
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

// encodeURI additionally keeps the URI delimiters
const URI: &AsciiSet = &COMPONENT
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'#');

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

fn encode_uri(value: &str) -> String {
    utf8_percent_encode(value, URI).to_string()
}

/// The "build a repo" form: its three inputs and the submit button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormState {
    pub git_url: String,
    pub branch: String,
    pub param: String,
    submit: Control,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            git_url: String::new(),
            branch: String::new(),
            param: String::new(),
            submit: Control::new("submitButton", "Build"),
        }
    }
}

impl FormState {
    /// Seeds the inputs from the page's own `url`, `branch` and `param`
    /// query parameters.
    pub fn from_query(query: &str) -> Self {
        let mut form = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);
        let parsed = reqwest::Url::parse(&format!("http://localhost/?{query}"));
        if let Ok(parsed) = parsed {
            for (k, v) in parsed.query_pairs() {
                match k.as_ref() {
                    "url" => form.git_url = v.into_owned(),
                    "branch" => form.branch = v.into_owned(),
                    "param" => form.param = v.into_owned(),
                    _ => {}
                }
            }
        }
        form
    }

    pub fn submit_button(&self) -> &Control {
        &self.submit
    }

    pub(crate) fn submit_button_mut(&mut self) -> &mut Control {
        &mut self.submit
    }

    pub fn submit(&mut self) {
        self.submit.set_disabled(true);
    }

    /// The equivalent command line for what the form would submit.
    pub fn curl_command(&self, action: &str) -> String {
        let url = if self.git_url.is_empty() {
            "git-url"
        } else {
            self.git_url.as_str()
        };
        let branch = if self.branch.is_empty() {
            "master"
        } else {
            self.branch.as_str()
        };
        let mut out = format!("curl -LNs -F 'gitUrl={url}' -F 'branch={branch}' ");
        if !self.param.is_empty() {
            out.push_str(&format!("-F 'param={}' ", self.param));
        }
        out.push_str(&format!("'{action}'"));
        out
    }

    /// Where the address bar should point after an edit; applied with a
    /// non-navigating history replacement.
    pub fn mirrored_location(&self, path: &str) -> String {
        let path = encode_uri(path);
        if self.git_url.is_empty() {
            return path;
        }
        format!("{path}?url={}", encode_component(&self.git_url))
    }
}
