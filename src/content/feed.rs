//! Syndication documents: the RSS 2.0 feed and the sitemap.

use chrono::{DateTime, Utc};

use crate::config::SiteSettings;
use crate::content::model::{Category, FeedItem, SlugEntry};

#[derive(Clone, Copy)]
enum ChangeFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl AsRef<str> for ChangeFrequency {
    fn as_ref(&self) -> &str {
        match self {
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
        }
    }
}

struct SitemapUrl {
    location: String,
    last_modified: DateTime<Utc>,
    frequency: ChangeFrequency,
    priority: &'static str,
}

/// Everything the sitemap lists besides the fixed sections.
pub struct SitemapContent<'a> {
    pub categories: &'a [Category],
    pub articles: &'a [SlugEntry],
    pub events: &'a [SlugEntry],
    pub rankings: &'a [SlugEntry],
}

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }

    escaped
}

pub fn render_rss(
    site: &SiteSettings,
    base_url: &str,
    items: &[FeedItem],
    built_at: DateTime<Utc>,
) -> String {
    let base_url = base_url.trim_end_matches('/');
    let mut document = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n<channel>\n",
    );

    document.push_str(&format!("<title>{}</title>\n", escape_xml(&site.name)));
    document.push_str(&format!("<link>{}</link>\n", escape_xml(base_url)));
    document.push_str(&format!(
        "<description>{}</description>\n",
        escape_xml(&site.description)
    ));
    document.push_str(&format!("<language>{}</language>\n", escape_xml(&site.language)));
    document.push_str(&format!(
        "<lastBuildDate>{}</lastBuildDate>\n",
        built_at.to_rfc2822()
    ));
    document.push_str(&format!(
        "<atom:link href=\"{}/rss.xml\" rel=\"self\" type=\"application/rss+xml\"/>\n",
        escape_xml(base_url)
    ));

    for item in items {
        let link = escape_xml(&format!("{}/{}", base_url, item.path));

        document.push_str("<item>\n");
        document.push_str(&format!("<title>{}</title>\n", escape_xml(&item.title)));
        document.push_str(&format!("<link>{}</link>\n", link));
        document.push_str(&format!("<guid isPermaLink=\"true\">{}</guid>\n", link));
        document.push_str(&format!(
            "<description>{}</description>\n",
            escape_xml(&item.excerpt)
        ));
        document.push_str(&format!("<category>{}</category>\n", escape_xml(&item.category)));
        document.push_str(&format!("<author>{}</author>\n", escape_xml(&item.author)));
        document.push_str(&format!(
            "<pubDate>{}</pubDate>\n",
            item.published_at.to_rfc2822()
        ));
        document.push_str("</item>\n");
    }

    document.push_str("</channel>\n</rss>\n");
    document
}

pub fn render_sitemap(base_url: &str, content: &SitemapContent<'_>, now: DateTime<Utc>) -> String {
    let base_url = base_url.trim_end_matches('/');
    let section = |path: &str, frequency, priority| SitemapUrl {
        location: format!("{}/{}", base_url, path),
        last_modified: now,
        frequency,
        priority,
    };

    let mut urls = vec![SitemapUrl {
        location: base_url.to_string(),
        last_modified: now,
        frequency: ChangeFrequency::Daily,
        priority: "1.0",
    }];
    urls.extend(
        content
            .categories
            .iter()
            .map(|category| section(&category.slug, ChangeFrequency::Weekly, "0.8")),
    );
    urls.push(section("eventos", ChangeFrequency::Weekly, "0.7"));
    urls.push(section("rankings", ChangeFrequency::Monthly, "0.7"));
    urls.push(section("newsletter", ChangeFrequency::Monthly, "0.6"));
    urls.push(section("sobre", ChangeFrequency::Monthly, "0.5"));

    let pages = [
        (content.articles, ChangeFrequency::Weekly, "0.8"),
        (content.events, ChangeFrequency::Weekly, "0.6"),
        (content.rankings, ChangeFrequency::Monthly, "0.7"),
    ];
    for (entries, frequency, priority) in pages {
        urls.extend(entries.iter().map(|entry| SitemapUrl {
            location: format!("{}/{}", base_url, entry.path),
            last_modified: entry.updated_at,
            frequency,
            priority,
        }));
    }

    let mut document = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for url in urls {
        document.push_str("<url>\n");
        document.push_str(&format!("<loc>{}</loc>\n", escape_xml(&url.location)));
        document.push_str(&format!(
            "<lastmod>{}</lastmod>\n",
            url.last_modified.format("%Y-%m-%d")
        ));
        document.push_str(&format!(
            "<changefreq>{}</changefreq>\n",
            url.frequency.as_ref()
        ));
        document.push_str(&format!("<priority>{}</priority>\n", url.priority));
        document.push_str("</url>\n");
    }
    document.push_str("</urlset>\n");

    document
}
