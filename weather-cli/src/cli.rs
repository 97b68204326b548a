use anyhow::Context;
use clap::Parser;
use cnweather_core::{
    Config, HttpFetcher, Index, IndexBuilder, Resolution, Resolver, WeatherError, fetch_forecast,
    index_age,
};
use std::{path::PathBuf, sync::Arc};
use tracing::debug;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "cnweather",
    version,
    about = "查询中国城市天气的终端工具 (data: weather.cma.cn)"
)]
pub struct Cli {
    /// City or province name, e.g. "深圳" or "广东". Partial names match.
    pub name: Option<String>,

    /// List every city of the matching province instead of showing a forecast.
    #[arg(short, long)]
    pub list: bool,

    /// Rebuild the city index from the website first.
    #[arg(long)]
    pub refresh: bool,

    /// Read (and with --refresh, write) the index at this path.
    #[arg(long, value_name = "PATH")]
    pub index: Option<PathBuf>,

    /// Print debug logs to stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Write a config file with the default settings and exit.
    #[arg(long, conflicts_with_all = ["name", "list", "refresh"])]
    pub init_config: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        if self.init_config {
            return init_config();
        }

        let mut config = Config::load()?;
        if let Some(path) = self.index {
            config.index_path = Some(path);
        }
        let index_path = config.index_file_path()?;
        let fetcher = Arc::new(HttpFetcher::from_config(&config));

        let index = if self.refresh {
            println!("正在从 {} 更新城市索引...", config.origin);
            let index = IndexBuilder::new(fetcher.clone(), &config)
                .build_and_save(&index_path)
                .await
                .with_context(|| format!("Failed to rebuild index at {}", index_path.display()))?;
            println!(
                "已写入 {} 个省份、{} 个城市: {}",
                index.provinces().len(),
                index.city_count(),
                index_path.display()
            );
            index
        } else {
            Index::load_or_empty(&index_path)
        };

        let Some(name) = requested_name(self.name) else {
            if !self.refresh {
                println!("请输入城市名，例如: cnweather 深圳");
            }
            return Ok(());
        };
        let name = name.as_str();

        if index.is_empty() {
            println!("城市索引为空，请先运行 `cnweather --refresh` 生成索引");
            return Ok(());
        }
        if !self.refresh {
            warn_if_stale(&index_path, &config);
        }

        let resolver = Resolver::new(&index);

        if self.list {
            let cities = resolver.list_cities(name);
            if cities.is_empty() {
                println!("请输入正确的省份名/直辖市名");
            } else {
                render::print_city_list(name, &cities);
            }
            return Ok(());
        }

        let resolution = match resolver.resolve(name) {
            Ok(resolution) => resolution,
            Err(WeatherError::EmptyProvince(province)) => {
                println!("{province} 暂无城市数据，请输入具体的城市名");
                return Ok(());
            }
            Err(e) => {
                debug!(error = %e, "resolution failed");
                println!("查询的城市名称有误！");
                return Ok(());
            }
        };

        if let Resolution::Province { province, city } = resolution {
            println!("{} 为省份名，显示 {} 的天气", province.name, city.name);
        }

        let url = &resolution.city().web_url;
        if url.is_empty() {
            println!("{} 没有天气预报页面", resolution.city().name);
            return Ok(());
        }

        match fetch_forecast(fetcher.as_ref(), url).await {
            Ok(report) => render::print_report(&report),
            Err(e) => println!("{e}"),
        }

        Ok(())
    }
}

/// The query as typed. Surrounding spaces are kept and take part in matching.
fn requested_name(name: Option<String>) -> Option<String> {
    name.filter(|n| !n.is_empty())
}

/// Write the default config unless a config file is already there.
fn init_config() -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    if path.exists() {
        println!("配置文件已存在: {}", path.display());
        return Ok(());
    }

    let path = Config::default().save()?;
    println!("已写入默认配置: {}", path.display());
    Ok(())
}

fn warn_if_stale(index_path: &std::path::Path, config: &Config) {
    match index_age(index_path) {
        Ok(age) if age > config.index_max_age() => eprintln!(
            "城市索引已超过 {} 天未更新，可运行 `cnweather --refresh` 刷新",
            config.index_max_age_days
        ),
        Ok(_) => {}
        Err(e) => debug!(error = %e, "could not determine index age"),
    }
}
