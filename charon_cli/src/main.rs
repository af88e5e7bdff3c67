use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mimalloc::MiMalloc;
use tracing::info;

use charon_osrm::{
    CachedLegFetcher, DEFAULT_OSRM_URL, FileLegStore, LegCacheOptions, OsrmClient,
    OsrmClientParams, OsrmProfile,
};
use charon_routing::{
    GeoPoint, PlannerOptions, RoutePlanner, format_distance, parse_road_features,
};

mod parsers;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan one route and print the polyline as GeoJSON
    Route {
        #[command(flatten)]
        args: RouteArgs,

        /// Current position as "lat,lng"
        #[arg(short, long, value_parser = parsers::parse_geopoint)]
        position: GeoPoint,
    },
    /// Replay recorded positions, replanning at a fixed interval
    #[command(visible_alias = "r")]
    Replay {
        #[command(flatten)]
        args: RouteArgs,

        /// JSON file with recorded positions: [{"lat": .., "lng": ..}, ..]
        #[arg(long)]
        positions: PathBuf,

        /// Delay between replayed positions (e.g., "2s", "500ms")
        #[arg(long, default_value = "2s", value_parser = parsers::parse_duration)]
        interval: jiff::SignedDuration,
    },
}

#[derive(Args)]
struct RouteArgs {
    /// Road network as a GeoJSON FeatureCollection
    #[arg(short, long)]
    roads: PathBuf,

    /// Destination as "lat,lng"
    #[arg(long, value_parser = parsers::parse_geopoint)]
    destination: GeoPoint,

    /// Durable leg cache location
    #[arg(long, default_value = "charon_legs.json")]
    cache_file: PathBuf,

    #[arg(long, default_value = DEFAULT_OSRM_URL)]
    osrm_url: String,
}

type CliPlanner = RoutePlanner<CachedLegFetcher<OsrmClient, FileLegStore>>;

fn build_planner(args: &RouteArgs) -> Result<CliPlanner, anyhow::Error> {
    let raw = std::fs::read_to_string(&args.roads)?;
    let features = parse_road_features(&raw)?;

    let client = OsrmClient::new(OsrmClientParams {
        osrm_url: args.osrm_url.clone(),
        profile: OsrmProfile::Foot,
    });
    let fetcher = CachedLegFetcher::new(
        client,
        FileLegStore::new(args.cache_file.clone()),
        LegCacheOptions::default(),
    );

    let planner = RoutePlanner::new(&features, fetcher, PlannerOptions::default());
    info!(nodes = planner.graph().node_count(), "Road graph ready");

    Ok(planner)
}

fn polyline_geojson(points: &[GeoPoint]) -> geojson::GeoJson {
    let coordinates = points.iter().map(|p| vec![p.lng, p.lat]).collect();
    geojson::GeoJson::Geometry(geojson::Geometry::new(geojson::Value::LineString(
        coordinates,
    )))
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Commands::Route { args, position } => {
            let planner = build_planner(&args)?;
            let route = planner.plan(&position, &args.destination).await;

            info!(
                distance = %format_distance(route.distance_meters),
                strategy = ?route.debug.head_strategy,
                "Planned route"
            );
            println!("{}", polyline_geojson(&route.polyline));
        }
        Commands::Replay {
            args,
            positions,
            interval,
        } => {
            let planner = build_planner(&args)?;
            let raw = std::fs::read_to_string(&positions)?;
            let positions: Vec<GeoPoint> = serde_json::from_str(&raw)?;

            info!(count = positions.len(), "Replaying recorded positions");
            for position in positions {
                let route = planner.plan(&position, &args.destination).await;
                info!(
                    lat = position.lat,
                    lng = position.lng,
                    distance = %format_distance(route.distance_meters),
                    points = route.polyline.len(),
                    strategy = ?route.debug.head_strategy,
                    "Replanned"
                );
                tokio::time::sleep(interval.unsigned_abs()).await;
            }
        }
    }

    Ok(())
}
