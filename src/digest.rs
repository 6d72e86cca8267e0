use chrono::{DateTime, Local};

use crate::model::CompanyRecord;

const MAX_PER_GROUP: usize = 10;

/// New companies sharing one `"{code} - {name}"` key.
#[derive(Debug, Clone)]
pub struct DigestGroup {
    pub key: String,
    pub companies: Vec<CompanyRecord>,
}

#[derive(Debug, Clone)]
pub struct Digest {
    pub groups: Vec<DigestGroup>,
    pub total: usize,
}

/// Rendered message, ready for any notifier.
#[derive(Debug, Clone)]
pub struct DigestMessage {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Group records by category, keeping first-seen group order and record order.
pub fn aggregate(records: &[CompanyRecord]) -> Digest {
    let mut groups: Vec<DigestGroup> = Vec::new();

    for r in records {
        let key = group_key(r);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(g) => g.companies.push(r.clone()),
            None => groups.push(DigestGroup {
                key,
                companies: vec![r.clone()],
            }),
        }
    }

    Digest {
        groups,
        total: records.len(),
    }
}

fn group_key(r: &CompanyRecord) -> String {
    format!(
        "{} - {}",
        r.category_code.as_deref().unwrap_or("unknown"),
        r.category_name.as_deref().unwrap_or("unknown")
    )
}

impl Digest {
    pub fn render(&self, generated_at: DateTime<Local>) -> DigestMessage {
        DigestMessage {
            subject: format!("Company Scraper Digest - {} New Companies Found", self.total),
            html: self.render_html(generated_at),
            text: self.render_text(),
        }
    }

    fn render_html(&self, generated_at: DateTime<Local>) -> String {
        let mut html = format!(
            "<h2>Company Scraper Daily Digest</h2>\n\
             <p>Found <strong>{}</strong> new companies that match your criteria:</p>\n",
            self.total
        );

        if self.groups.is_empty() {
            html.push_str(
                "<p style=\"color: #64748b;\">No new companies found this time. \
                 We'll keep monitoring for you!</p>\n",
            );
        } else {
            html.push_str("<div style=\"margin: 20px 0;\">\n");
            for g in &self.groups {
                html.push_str(&format!(
                    "<h3 style=\"color: #2563eb; margin-top: 20px;\">{} ({} companies)</h3>\n\
                     <ul style=\"list-style-type: none; padding-left: 0;\">\n",
                    escape(&g.key),
                    g.companies.len()
                ));
                for c in g.companies.iter().take(MAX_PER_GROUP) {
                    html.push_str(&company_item(c));
                }
                if g.companies.len() > MAX_PER_GROUP {
                    html.push_str(&format!(
                        "<li style=\"padding: 10px; font-style: italic;\">... and {} more companies</li>\n",
                        g.companies.len() - MAX_PER_GROUP
                    ));
                }
                html.push_str("</ul>\n");
            }
            html.push_str("</div>\n");
        }

        html.push_str(&format!(
            "<hr style=\"margin: 30px 0;\">\n\
             <p style=\"color: #64748b; font-size: 12px;\">\
             This automated digest was generated at {}<br>Powered by Company Scraper</p>\n",
            generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        html
    }

    fn render_text(&self) -> String {
        let mut text = format!(
            "Company Scraper Digest: Found {} new companies. \
             Please view the HTML version for full details.\n",
            self.total
        );
        if self.groups.is_empty() {
            text.push_str("\nNo new companies found this time.\n");
        }
        for g in &self.groups {
            text.push_str(&format!("\n{} ({} companies)\n", g.key, g.companies.len()));
            for c in &g.companies {
                text.push_str(&format!(
                    "- {} | Org #: {} | {} | Founded: {}\n",
                    c.name, c.organization_id, c.location, c.founded_date
                ));
            }
        }
        text
    }
}

fn company_item(c: &CompanyRecord) -> String {
    let link = c
        .detail_url
        .as_deref()
        .map(|u| {
            format!(
                "<br><a href=\"{}\" style=\"color: #2563eb;\">View Details →</a>",
                escape(u)
            )
        })
        .unwrap_or_default();
    format!(
        "<li style=\"margin: 10px 0; padding: 10px; border-left: 3px solid #2563eb; background-color: #f8fafc;\">\
         <strong>{}</strong><br>\
         <small style=\"color: #64748b;\">Org #: {} | Location: {} | Founded: {}</small>{}</li>\n",
        escape(&c.name),
        escape(&c.organization_id),
        escape(if c.location.is_empty() { "N/A" } else { c.location.as_str() }),
        escape(&c.founded_date),
        link
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ── Tests ──
