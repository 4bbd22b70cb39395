use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    UserInvitation,
}

/// Values substituted into a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateData {
    pub username: String,
    pub activation_url: String,
}

pub struct Rendered {
    pub subject: String,
    pub html: String,
}

impl Template {
    pub fn name(self) -> &'static str {
        match self {
            Self::UserInvitation => "user_invitation",
        }
    }

    pub fn render(self, data: &TemplateData) -> Rendered {
        match self {
            Self::UserInvitation => Rendered {
                subject: "Finish Registration with GopherSocial".to_string(),
                html: format!(
                    "<!doctype html>\
                     <html><body>\
                     <p>Hi {name},</p>\
                     <p>Thanks for signing up for GopherSocial. We're excited to have you on board!</p>\
                     <p>Before you can start using GopherSocial, you need to confirm your email address. \
                     Click the link below to confirm your email address:</p>\
                     <p><a href=\"{url}\">{url}</a></p>\
                     <p>If you want to activate your account manually copy and paste the link above into your browser.</p>\
                     <p>If you didn't sign up for GopherSocial, you can safely ignore this email.</p>\
                     <p>Thanks,<br/>The GopherSocial Team</p>\
                     </body></html>",
                    name = escape_html(&data.username),
                    url = escape_html(&data.activation_url),
                ),
            },
        }
    }
}

fn escape_html(s: &str) -> String {
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
