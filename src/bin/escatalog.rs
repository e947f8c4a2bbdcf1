use escatalog::SchemaCatalog;
use escatalog::config::CatalogConfig;
use escatalog::gateway::cached::CachedGateway;
use escatalog::gateway::http::HttpGateway;
use std::sync::Arc;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return Err("missing command".into());
    }
    match args[1].as_str() {
        "tables" => cmd_tables(&args[2..]),
        "columns" => cmd_columns(&args[2..]),
        other => {
            print_usage();
            Err(format!("unknown command: {other}"))
        }
    }
}

fn cmd_tables(args: &[String]) -> Result<(), String> {
    let catalog = open_catalog(args)?;
    for table in catalog.store().tables() {
        println!("{}\t{}", table.name, table.url);
    }
    catalog.stop();
    Ok(())
}

fn cmd_columns(args: &[String]) -> Result<(), String> {
    let table = parse_flag_value(args, "--table").ok_or("--table is required")?;
    let catalog = open_catalog(args)?;
    let columns = catalog
        .get_columns(&table)
        .map_err(|e| format!("columns for {table}: {e}"))?;
    for column in columns {
        let cardinality = column
            .cardinality
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into());
        let domain = column
            .domain
            .as_ref()
            .map(|d| d.kind())
            .unwrap_or("pending");
        println!(
            "{}\t{}\t{}\t{}",
            column.abs_name,
            column.column_type,
            cardinality,
            domain
        );
    }
    catalog.stop();
    Ok(())
}

fn open_catalog(args: &[String]) -> Result<SchemaCatalog, String> {
    let url = parse_flag_value(args, "--url").ok_or("--url is required")?;
    let config = CatalogConfig::default();
    let gateway = HttpGateway::new(&url).map_err(|e| format!("gateway for {url}: {e}"))?;
    let gateway = CachedGateway::new(gateway, config.mapping_cache_ttl);
    let catalog =
        SchemaCatalog::open(config, Arc::new(gateway)).map_err(|e| format!("open catalog: {e}"))?;
    catalog
        .wait_until_ready()
        .map_err(|e| format!("discovery against {url}: {e}"))?;
    Ok(catalog)
}

fn parse_flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn print_usage() {
    eprintln!(
        "usage:\n  escatalog tables --url <backend-url>\n  escatalog columns --url <backend-url> --table <name>"
    );
}
