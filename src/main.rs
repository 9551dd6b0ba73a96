//! Lookup Sheets API Server binary
//!
//! HTTP REST API for typed in-memory sheets with lookup formulas.

use clap::Parser;
use lookup_sheets::api::{run_api_server, ApiConfig};

#[derive(Parser, Debug)]
#[command(name = "sheets-server")]
#[command(version)]
#[command(about = "Lookup Sheets API Server - typed in-memory sheets with lookup formulas")]
#[command(long_about = r#"
Lookup Sheets API Server

Sheets have a fixed list of typed columns (boolean, int, double, string).
A cell holds a literal or a formula of the form lookup(<column>,<row>);
writing a cell re-resolves every formula that depends on it.

Endpoints:
  - POST   /sheet                                  - Create a sheet
  - GET    /sheets                                 - List all sheets
  - GET    /sheet/:sheet_id                        - Get a sheet
  - DELETE /sheet/:sheet_id                        - Delete a sheet
  - PUT    /sheet/:sheet_id/cell                   - Set a cell
  - GET    /sheet/:sheet_id/cell/:column/:row/audit - Audit a cell

Additional endpoints:
  - GET  /health           - Health check
  - GET  /version          - Server version info
  - GET  /                 - API documentation

Logging is controlled with RUST_LOG (default: lookup_sheets=info,tower_http=info).

Example usage:
  sheets-server                           # Start on localhost:3000
  sheets-server --host 0.0.0.0 --port 8080

  curl -X POST http://localhost:3000/sheet \
    -H "Content-Type: application/json" \
    -d '{"columns": [{"name": "A", "type": "string"}]}'
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "SHEETS_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "SHEETS_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lookup_sheets=info,tower_http=info".into()),
        )
        .init();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
    };

    run_api_server(config).await
}
