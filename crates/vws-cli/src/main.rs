use std::path::PathBuf;
use std::{fs, io};

use anyhow::Context;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use serde::Deserialize;
use tokio::runtime;
use vws_crawler::{Category, Crawler, CrawlerConfig, Fetch, HttpFetcher, RunReport, Throttle};
use vws_wiki::fields::extract_fields;
use vws_wiki::writer::{columns, CsvDialect, CsvSink, JsonSink, Sink};
use vws_wiki::{Html, WikiScraper};

const DEFAULT_LOG_FILTER: &str = "vws=info,vws_crawler=info,vws_wiki=warn";

/// VALORANT Wiki Scraper
#[derive(Debug, Parser)]
#[clap(name = "vws", version)]
pub struct Args {
    #[clap(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    #[clap(name = "crawl")]
    Crawl(CrawlArgs),
    #[clap(name = "scrap")]
    Scrap(ScrapArgs),
    #[clap(hide = true)]
    Completion,
}

/// Crawl wiki categories and write their entities as CSV and JSON
#[derive(Debug, clap::Args)]
pub struct CrawlArgs {
    /// Path to the CSV output file
    #[clap(
        parse(from_os_str),
        long,
        short,
        default_value = "valorant_detailed_data.csv"
    )]
    pub output_file: PathBuf,
    /// Path to the JSON output file
    #[clap(
        parse(from_os_str),
        long,
        short,
        default_value = "valorant_detailed_data.json"
    )]
    pub json_file: PathBuf,
    /// Optional crawler yaml configuration file, may hold a `csv` dialect section
    #[clap(env = "VWS_CRAWLER_CONFIG", parse(from_os_str), long)]
    pub crawler_config: Option<PathBuf>,
    /// Override crawler's user agent
    #[clap(long)]
    pub user_agent: Option<String>,
    /// Override crawler's maximum concurrent page downloads
    #[clap(long)]
    pub concurrent_downloads: Option<usize>,
    /// Override crawler's delay in seconds between requests
    #[clap(long)]
    pub delay: Option<f32>,
    /// Override crawler's advisory minimum record count
    #[clap(long)]
    pub min_records: Option<usize>,
    /// Only crawl the given categories, may be repeated
    #[clap(long = "category")]
    pub categories: Vec<String>,
    /// When quiet no logs are outputted
    #[clap(long, short)]
    pub quiet: bool,
}

/// Content of the `--crawler-config` file.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(flatten)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub csv: CsvDialect,
}

impl TryFrom<&CrawlArgs> for Settings {
    type Error = anyhow::Error;

    fn try_from(args: &CrawlArgs) -> Result<Self, Self::Error> {
        let mut settings: Settings = if let Some(path) = &args.crawler_config {
            let file = fs::File::open(path)
                .with_context(|| format!("Couldn't open {}", path.display()))?;
            serde_yaml::from_reader(file)
                .with_context(|| format!("Invalid config {}", path.display()))?
        } else {
            Settings::default()
        };
        settings.crawler = override_crawler(settings.crawler, args)?;
        settings.csv.check()?;
        Ok(settings)
    }
}

impl TryFrom<&CrawlArgs> for CrawlerConfig {
    type Error = anyhow::Error;

    fn try_from(args: &CrawlArgs) -> Result<Self, Self::Error> {
        Settings::try_from(args).map(|settings| settings.crawler)
    }
}

fn override_crawler(mut conf: CrawlerConfig, args: &CrawlArgs) -> anyhow::Result<CrawlerConfig> {
    if let Some(user_agent) = &args.user_agent {
        conf.user_agent = user_agent.to_string();
    }
    if let Some(concurrent_downloads) = args.concurrent_downloads {
        conf.concurrent_downloads = concurrent_downloads;
    }
    if let Some(delay) = args.delay {
        conf.throttle = Some(Throttle::Delay(delay));
    }
    if let Some(min_records) = args.min_records {
        conf.min_records = min_records;
    }
    if !args.categories.is_empty() {
        for name in &args.categories {
            if !conf
                .categories
                .iter()
                .any(|spec| spec.name.as_str().eq_ignore_ascii_case(name))
            {
                anyhow::bail!("Category `{name}` is not configured");
            }
        }
        conf.categories.retain(|spec| {
            args.categories
                .iter()
                .any(|name| spec.name.as_str().eq_ignore_ascii_case(name))
        });
    }
    conf.validate()?;
    Ok(conf)
}

pub fn crawl(args: CrawlArgs) -> anyhow::Result<()> {
    let Settings { crawler: conf, csv } = (&args).try_into()?;
    log::info!(
        "Crawling {} categories from {} as {}",
        conf.categories.len(),
        conf.base_url,
        conf.user_agent
    );
    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;

    let report = rt.block_on(async {
        let fetcher = HttpFetcher::new(conf.user_agent.clone());
        let crawler = Crawler::new(&conf, fetcher, WikiScraper::from(&conf));
        crawler.run(&conf.categories).await
    });

    let columns = columns(&report.records);
    CsvSink::with_dialect(&args.output_file, csv).write(&report.records, &columns)?;
    JsonSink::new(&args.json_file).write(&report.records, &columns)?;
    log::info!(
        "Saved {} records to {} and {}",
        report.records.len(),
        args.output_file.display(),
        args.json_file.display()
    );

    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    for summary in &report.summaries {
        println!("{}: {} records", summary.category, summary.records);
    }
    println!("Total: {} records", report.records.len());
    if report.below_minimum() {
        println!(
            "Only {} records collected, fewer than the expected {}",
            report.records.len(),
            report.min_records
        );
    }
}

/// Extract a single entity page and print its record as JSON
#[derive(Debug, clap::Args)]
#[clap(group = clap::ArgGroup::new("page").required(true))]
pub struct ScrapArgs {
    /// Category whose fields are extracted
    #[clap(long)]
    pub category: String,
    /// Entity name stored in the record
    #[clap(long)]
    pub name: String,
    /// A local html page to scrap
    #[clap(group = "page", parse(from_os_str), long)]
    pub file: Option<PathBuf>,
    /// A distant html page to scrap
    #[clap(group = "page", long)]
    pub url: Option<String>,
    /// Custom user agent to download the page
    #[clap(long, conflicts_with = "file")]
    pub ua: Option<String>,
}

pub fn scrap(args: ScrapArgs) -> anyhow::Result<()> {
    let page = if let Some(url) = &args.url {
        let fetcher = HttpFetcher::new(args.ua.clone().unwrap_or_else(|| {
            CrawlerConfig::default().user_agent
        }));
        let rt = runtime::Builder::new_current_thread().enable_all().build()?;
        rt.block_on(fetcher.fetch(url))?
    } else if let Some(path) = &args.file {
        fs::read_to_string(path).with_context(|| format!("Couldn't read {}", path.display()))?
    } else {
        anyhow::bail!("Missing `url` or `file`");
    };

    let doc = Html::parse_document(&page);
    let record = extract_fields(&doc, &args.name, &Category::from(args.category.as_str()));
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.cmd {
        SubCommand::Crawl(args) => {
            if !args.quiet {
                init_logger();
            }
            crawl(args)
        }
        SubCommand::Scrap(args) => {
            init_logger();
            scrap(args)
        }
        SubCommand::Completion => {
            generate(Shell::Bash, &mut Args::command(), "vws", &mut io::stdout());
            Ok(())
        }
    }
}
