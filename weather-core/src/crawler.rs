//! Builds the province/city index by crawling the listing pages.
//!
//! The root listing yields the provinces; every province page is then
//! fetched by a small pool of workers pulling `(slot, url)` jobs off a
//! bounded channel. Each worker keeps the cities it found and hands them back
//! when it finishes, and the results are written into the province at `slot`,
//! so the index keeps the root page order however the fetches complete.

use scraper::Html;
use std::{path::Path, sync::Arc};
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinSet,
};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::Result,
    fetch::PageSource,
    index::Index,
    model::{City, Province},
};

/// Link text of the per-row "details" column, which is not a city.
const DETAILS_LABEL: &str = "详情>>";

#[derive(Debug)]
struct CrawlJob {
    slot: usize,
    province: String,
    url: String,
}

type JobQueue = Arc<Mutex<mpsc::Receiver<CrawlJob>>>;

#[derive(Debug, Clone)]
pub struct IndexBuilder {
    source: Arc<dyn PageSource>,
    origin: String,
    root_url: String,
    concurrency: usize,
}

impl IndexBuilder {
    pub fn new(source: Arc<dyn PageSource>, config: &Config) -> Self {
        Self {
            source,
            origin: config.origin.clone(),
            root_url: config.root_listing_url(),
            concurrency: config.crawl_concurrency(),
        }
    }

    /// Crawl the whole site.
    ///
    /// Failing to fetch the root listing fails the build. A province whose
    /// page cannot be fetched is logged and kept with no cities.
    pub async fn build(&self) -> Result<Index> {
        let body = self.source.fetch_page(&self.root_url).await?;
        let mut provinces = parse_province_listing(&body, &self.origin);
        info!(provinces = provinces.len(), "discovered provinces");

        let (tx, rx) = mpsc::channel(self.concurrency);
        let queue: JobQueue = Arc::new(Mutex::new(rx));

        let mut workers = JoinSet::new();
        for _ in 0..self.concurrency {
            workers.spawn(crawl_worker(
                queue.clone(),
                self.source.clone(),
                self.origin.clone(),
            ));
        }

        for (slot, province) in provinces.iter().enumerate() {
            if province.web_url.is_empty() {
                debug!(province = %province.name, "no listing link, skipping");
                continue;
            }
            let job = CrawlJob {
                slot,
                province: province.name.clone(),
                url: province.web_url.clone(),
            };
            if tx.send(job).await.is_err() {
                warn!("all crawl workers exited early");
                break;
            }
        }
        drop(tx);

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(found) => {
                    for (slot, cities) in found {
                        provinces[slot].cities = cities;
                    }
                }
                Err(e) => warn!(error = %e, "crawl worker failed"),
            }
        }

        let index = Index::new(provinces);
        info!(cities = index.city_count(), "index built");
        Ok(index)
    }

    /// Crawl the site and write the index to `path`, replacing what was there.
    pub async fn build_and_save(&self, path: &Path) -> Result<Index> {
        let index = self.build().await?;
        index.save(path)?;
        info!(path = %path.display(), "index written");
        Ok(index)
    }
}

async fn crawl_worker(
    queue: JobQueue,
    source: Arc<dyn PageSource>,
    origin: String,
) -> Vec<(usize, Vec<City>)> {
    let mut found = Vec::new();

    loop {
        let job = queue.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };

        match source.fetch_page(&job.url).await {
            Ok(body) => {
                let cities = parse_city_listing(&body, &origin);
                debug!(
                    province = %job.province,
                    cities = cities.len(),
                    "province crawled"
                );
                found.push((job.slot, cities));
            }
            Err(e) => warn!(province = %job.province, error = %e, "failed to fetch cities"),
        }
    }

    found
}

/// Provinces on the root listing page, in page order, with no cities yet.
pub fn parse_province_listing(html: &str, origin: &str) -> Vec<Province> {
    let document = Html::parse_document(html);

    document
        .select(selector!(".province-list .province-item"))
        .map(|item| Province {
            name: item.text().collect(),
            web_url: item
                .value()
                .attr("href")
                .map(|path| format!("{origin}{path}"))
                .unwrap_or_default(),
            cities: Vec::new(),
        })
        .collect()
}

/// Cities on a province listing page. Links point at the forecast page.
pub fn parse_city_listing(html: &str, origin: &str) -> Vec<City> {
    let document = Html::parse_document(html);

    document
        .select(selector!(".tab-pane.active .day-table tbody tr td a"))
        .filter_map(|link| {
            let name: String = link.text().collect();
            if name.is_empty() || name == DETAILS_LABEL {
                return None;
            }
            let web_url = link
                .value()
                .attr("href")
                .map(|path| format!("{origin}{path}.html"))
                .unwrap_or_default();
            Some(City { name, web_url })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeatherError;
    use async_trait::async_trait;
    use std::{
        collections::{HashMap, HashSet},
        sync::atomic::{AtomicUsize, Ordering},
    };

    const ORIGIN: &str = "https://weather.cma.cn";

    const ROOT: &str = r#"
        <html><body>
          <div class="province-list">
            <a class="province-item" href="/web/text/HB/ABJ.html">北京</a>
            <a class="province-item" href="/web/text/HD/ASH.html">上海</a>
            <a class="province-item" href="/web/text/HN/AGD.html">广东</a>
            <a class="province-item">台湾</a>
          </div>
        </body></html>
    "#;

    fn city_page(cities: &[(&str, &str)]) -> String {
        let rows: String = cities
            .iter()
            .map(|(name, id)| {
                format!(
                    r#"<tr>
                         <td><a href="/web/weather/{id}">{name}</a></td>
                         <td><a href="/web/weather/{id}">详情>></a></td>
                       </tr>"#
                )
            })
            .collect();
        format!(
            r#"<html><body>
                 <div class="tab-pane">
                   <table class="day-table">
                     <tr><td><a href="/web/weather/1">Hidden</a></td></tr>
                   </table>
                 </div>
                 <div class="tab-pane active">
                   <table class="day-table">
                     <tr><th>城市</th></tr>
                     {rows}
                     <tr><td><a href="/x"></a></td></tr>
                   </table>
                 </div>
               </body></html>"#
        )
    }

    #[derive(Debug, Default)]
    struct FakeSite {
        pages: HashMap<String, String>,
        broken: HashSet<String>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        requests: AtomicUsize,
    }

    impl FakeSite {
        fn cma() -> Self {
            let mut pages = HashMap::new();
            pages.insert(format!("{ORIGIN}/web/text/HB/ABJ.html"), ROOT.to_string());
            pages.insert(
                format!("{ORIGIN}/web/text/HD/ASH.html"),
                city_page(&[("徐家汇", "58367"), ("浦东", "58370")]),
            );
            pages.insert(
                format!("{ORIGIN}/web/text/HN/AGD.html"),
                city_page(&[("广州", "59287"), ("深圳", "59493")]),
            );
            Self {
                pages,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl PageSource for FakeSite {
        async fn fetch_page(&self, url: &str) -> Result<String> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.broken.contains(url) {
                return Err(WeatherError::network(url, "connection reset"));
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| WeatherError::network(url, "status 404 Not Found: "))
        }
    }

    fn builder(site: Arc<FakeSite>) -> IndexBuilder {
        IndexBuilder::new(site, &Config::default())
    }

    #[test]
    fn province_listing_keeps_page_order_and_absolute_links() {
        let provinces = parse_province_listing(ROOT, ORIGIN);

        let names: Vec<_> = provinces.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["北京", "上海", "广东", "台湾"]);
        assert_eq!(
            provinces[1].web_url,
            "https://weather.cma.cn/web/text/HD/ASH.html"
        );
        assert_eq!(provinces[3].web_url, "");
    }

    #[test]
    fn city_listing_skips_details_links_and_blank_text() {
        let page = city_page(&[("广州", "59287"), ("深圳", "59493")]);
        let cities = parse_city_listing(&page, ORIGIN);

        assert_eq!(
            cities,
            vec![
                City {
                    name: "广州".into(),
                    web_url: "https://weather.cma.cn/web/weather/59287.html".into(),
                },
                City {
                    name: "深圳".into(),
                    web_url: "https://weather.cma.cn/web/weather/59493.html".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn builds_full_index_in_root_order() {
        let site = Arc::new(FakeSite::cma());
        let index = builder(site.clone()).build().await.unwrap();

        let provinces = index.provinces();
        assert_eq!(provinces.len(), 4);
        assert_eq!(provinces[0].name, "北京");
        assert_eq!(
            provinces[2].cities[1].web_url,
            "https://weather.cma.cn/web/weather/59493.html"
        );
        assert!(provinces[3].cities.is_empty());

        // root + three provinces with links
        assert_eq!(site.requests.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_more_than_three_province_fetches_in_flight() {
        let mut site = FakeSite::cma();
        let mut root = String::from(r#"<div class="province-list">"#);
        for i in 0..20 {
            let path = format!("/web/text/P/{i}.html");
            root.push_str(&format!(r#"<a class="province-item" href="{path}">省{i}</a>"#));
            site.pages.insert(format!("{ORIGIN}{path}"), city_page(&[("城", "1")]));
        }
        root.push_str("</div>");
        site.pages.insert(format!("{ORIGIN}/web/text/HB/ABJ.html"), root);

        let site = Arc::new(site);
        let index = builder(site.clone()).build().await.unwrap();

        assert_eq!(index.provinces().len(), 20);
        assert_eq!(index.city_count(), 20);
        assert!(site.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn one_failed_province_keeps_the_rest_and_still_writes() {
        let mut site = FakeSite::cma();
        site.broken.insert(format!("{ORIGIN}/web/text/HD/ASH.html"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let index = builder(Arc::new(site)).build_and_save(&path).await.unwrap();

        let provinces = index.provinces();
        assert_eq!(provinces.len(), 4);
        assert_eq!(provinces[1].name, "上海");
        assert!(provinces[1].cities.is_empty());
        assert_eq!(provinces[2].cities.len(), 2);

        assert_eq!(Index::load(&path).unwrap(), index);
    }

    #[tokio::test]
    async fn root_listing_failure_aborts_build() {
        let mut site = FakeSite::cma();
        site.broken.insert(format!("{ORIGIN}/web/text/HB/ABJ.html"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let err = builder(Arc::new(site))
            .build_and_save(&path)
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::Network { .. }));
        assert!(!path.exists());
    }
}
