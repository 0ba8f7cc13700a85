use askama::Template;
use async_smtp::authentication::{Credentials, Mechanism};
use async_smtp::{EmailAddress, Envelope, SendableEmail, SmtpClient, SmtpTransport};
use chrono::Local;
use tokio::io::BufStream;
use tokio::net::TcpStream;

use crate::configuration::EmailSettings;
use crate::domain::country::Country;
use crate::domain::job::JobPosting;

/// Digest presentation order; Unknown never reaches the digest.
const COUNTRY_ORDER: [Country; 4] = [
    Country::Uae,
    Country::SaudiArabia,
    Country::Qatar,
    Country::UnitedKingdom,
];

#[derive(Template)]
#[template(path = "digest.html")]
struct DigestTemplate {
    generated_at: String,
    total_jobs: usize,
    country_count: usize,
    company_count: usize,
    countries: Vec<CountryGroup>,
}

struct CountryGroup {
    name: &'static str,
    total: usize,
    companies: Vec<CompanyGroup>,
}

struct CompanyGroup {
    name: String,
    jobs: Vec<JobEntry>,
}

struct JobEntry {
    title: String,
    location: String,
    url: String,
}

/// Renders the HTML digest and hands it to the configured SMTP relay.
/// A delivery failure is logged by the caller and never rolls back the
/// seen-set: at-most-once notification per identity.
pub struct DigestMailer {
    settings: EmailSettings,
}

impl DigestMailer {
    pub fn new(settings: EmailSettings) -> Self {
        DigestMailer { settings }
    }

    pub async fn send_digest(&self, new_jobs: &[&JobPosting]) -> anyhow::Result<()> {
        if new_jobs.is_empty() {
            log::info!("No new jobs found - skipping email");
            return Ok(());
        }
        if !self.settings.enabled {
            log::info!(
                "Email delivery disabled; {} new postings not mailed",
                new_jobs.len()
            );
            return Ok(());
        }

        let countries = group_by_country(new_jobs);
        let subject = format!(
            "{} New Job Opportunities Across {} Countries",
            new_jobs.len(),
            countries.len()
        );
        let body = render_digest(new_jobs)?;

        let message = format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/html; charset=utf-8\r\n\r\n{}",
            self.settings.from, self.settings.recipient, subject, body
        );

        let address = format!("{}:{}", self.settings.smtp_host, self.settings.smtp_port);
        let stream = BufStream::new(TcpStream::connect(&address).await?);
        let mut transport = SmtpTransport::new(SmtpClient::new(), stream).await?;

        if !self.settings.username.is_empty() {
            let credentials = Credentials::new(
                self.settings.username.clone(),
                self.settings.password.clone(),
            );
            transport
                .try_login(&credentials, &[Mechanism::Plain, Mechanism::Login])
                .await?;
        }

        let from: EmailAddress = self.settings.from.parse()?;
        let recipient: EmailAddress = self.settings.recipient.parse()?;
        let email = SendableEmail::new(Envelope::new(Some(from), vec![recipient])?, message);

        transport.send(email).await?;
        transport.quit().await?;

        log::info!(
            "Digest with {} postings sent to {}",
            new_jobs.len(),
            self.settings.recipient
        );
        Ok(())
    }
}

fn render_digest(new_jobs: &[&JobPosting]) -> anyhow::Result<String> {
    let countries = group_by_country(new_jobs);
    let company_count = countries.iter().map(|c| c.companies.len()).sum();

    let template = DigestTemplate {
        generated_at: Local::now().format("%A, %B %d, %Y").to_string(),
        total_jobs: new_jobs.len(),
        country_count: countries.len(),
        company_count,
        countries,
    };

    Ok(template.render()?)
}

/// Groups postings by country (fixed presentation order) then by source
/// company (discovery order within a country).
fn group_by_country(new_jobs: &[&JobPosting]) -> Vec<CountryGroup> {
    let mut groups = Vec::new();

    for country in COUNTRY_ORDER {
        let mut companies: Vec<CompanyGroup> = Vec::new();

        for job in new_jobs.iter().filter(|job| job.country == country) {
            let entry = JobEntry {
                title: job.title.clone(),
                location: job.location_label.clone(),
                url: job.url.clone(),
            };

            match companies
                .iter_mut()
                .find(|company| company.name == job.source_name)
            {
                Some(company) => company.jobs.push(entry),
                None => companies.push(CompanyGroup {
                    name: job.source_name.clone(),
                    jobs: vec![entry],
                }),
            }
        }

        if !companies.is_empty() {
            groups.push(CountryGroup {
                name: country.display_name(),
                total: companies.iter().map(|c| c.jobs.len()).sum(),
                companies,
            });
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(source: &str, title: &str, country: Country, label: &str) -> JobPosting {
        JobPosting::new(
            source.to_string(),
            title.to_string(),
            format!(
                "https://{}.example.com/{}",
                source.to_lowercase(),
                title.len()
            ),
            title.to_string(),
            country,
            label.to_string(),
        )
    }

    #[test]
    fn groups_follow_country_then_company() {
        let jobs = vec![
            job(
                "HSBC",
                "Treasury Analyst",
                Country::UnitedKingdom,
                "London, UK",
            ),
            job("Emaar", "Finance Manager", Country::Uae, "Dubai, UAE"),
            job("Emaar", "Head of Treasury", Country::Uae, "Dubai, UAE"),
            job("QNB", "Group CFO", Country::Qatar, "Doha, Qatar"),
        ];
        let refs: Vec<&JobPosting> = jobs.iter().collect();

        let groups = group_by_country(&refs);

        let names: Vec<&str> = groups.iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["UAE", "Qatar", "United Kingdom"]);
        assert_eq!(groups[0].total, 2);
        assert_eq!(groups[0].companies.len(), 1);
        assert_eq!(groups[0].companies[0].jobs.len(), 2);
    }

    #[test]
    fn digest_renders_titles_and_locations() {
        let jobs = vec![
            job("Emaar", "Finance Manager", Country::Uae, "Dubai, UAE"),
            job("QNB", "Group CFO", Country::Qatar, "Doha, Qatar"),
        ];
        let refs: Vec<&JobPosting> = jobs.iter().collect();

        let html = render_digest(&refs).unwrap();

        assert!(html.contains("Finance Manager"));
        assert!(html.contains("Dubai, UAE"));
        assert!(html.contains("QNB"));
        assert!(html.contains("2"));
    }

    #[test]
    fn unknown_country_never_appears_in_a_group() {
        let jobs = vec![job(
            "Emaar",
            "Mystery Role",
            Country::Unknown,
            "location unknown",
        )];
        let refs: Vec<&JobPosting> = jobs.iter().collect();

        assert!(group_by_country(&refs).is_empty());
    }
}
