//! Engines scraping an HTML results page with CSS selectors

use super::request::{clean_text, resolve_url, RequestTemplate};
use super::traits::*;
use crate::config::EngineConfig;
use crate::network::accept_html;
use crate::results::RawResult;
use anyhow::Result;
use scraper::{Html, Selector};

/// An HTML engine described entirely by its configuration
pub struct CssEngine {
    name: String,
    categories: Vec<String>,
    weight: f64,
    request: RequestTemplate,
    results: Selector,
    url: Selector,
    title: Selector,
    content: Option<Selector>,
    url_prefix: Option<String>,
    template: String,
}

fn compile(field: &str, selector: &str) -> Result<Selector> {
    if selector.trim().is_empty() {
        anyhow::bail!("selector for {} is empty", field);
    }
    Selector::parse(selector)
        .map_err(|e| anyhow::anyhow!("invalid {} selector {:?}: {:?}", field, selector, e))
}

impl CssEngine {
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            name: config.name.to_lowercase(),
            categories: config.categories.clone(),
            weight: config.weight,
            request: RequestTemplate::from_config(config)?,
            results: compile("results", &config.results)?,
            url: compile("url", &config.url)?,
            title: compile("title", &config.title)?,
            content: config
                .content
                .as_deref()
                .map(|c| compile("content", c))
                .transpose()?,
            url_prefix: config.url_prefix.clone(),
            template: config.template.clone(),
        })
    }

    fn parse_results(&self, html: &str) -> Vec<RawResult> {
        let document = Html::parse_document(html);
        let category = self.categories.first().cloned();
        let mut results = Vec::new();
        let mut position = 1u32;

        for element in document.select(&self.results) {
            let title = element
                .select(&self.title)
                .next()
                .map(|t| clean_text(&t.text().collect::<String>()))
                .unwrap_or_default();
            if title.is_empty() {
                continue;
            }

            let url = element
                .select(&self.url)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolve_url(self.url_prefix.as_deref(), href));
            let Some(url) = url else {
                continue;
            };

            let snippet = self.content.as_ref().and_then(|selector| {
                element
                    .select(selector)
                    .next()
                    .map(|s| clean_text(&s.text().collect::<String>()))
            });

            let mut result = RawResult::new(url, title, self.name.clone()).with_position(position);
            if let Some(content) = snippet {
                result = result.with_content(content);
            }
            result.category = category.clone();
            result.template = Some(self.template.clone());
            position += 1;

            results.push(result);
        }

        results
    }
}

impl Engine for CssEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_paging(&self) -> bool {
        self.request.supports_paging()
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn request(&self, params: &RequestParams) -> Result<EngineRequest> {
        Ok(self.request.build(params).header("Accept", accept_html()))
    }

    fn response(&self, response: EngineResponse) -> Result<EngineResults> {
        response.error_for_status()?;
        Ok(EngineResults::with_results(self.parse_results(&response.text)))
    }
}
