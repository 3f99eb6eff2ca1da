//! Create a `users` table and write two rows into it.
//!
//! The database path comes from `CLASS_TO_SQL_DB` (default `db/peppermint.db`).
//! Set `RUST_LOG=debug` to see the generated SQL.
//!
//! ```sh
//! cargo run --example basic
//! ```

use log::{LevelFilter, info};

use class_to_sql::{FieldType, Metadata, Record, TableStore, TableStoreError};

#[tokio::main]
async fn main() -> Result<(), TableStoreError> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let store = TableStore::from_env();
    info!("using database {}", store.config().database_path.display());

    let meta = Metadata::builder()
        .field("id", FieldType::Integer)
        .field("name", FieldType::Text)
        .field("profile", FieldType::Json)
        .primary_key(["id"])
        .default_value("name", "unknown")
        .build();

    store.create_table("users", &meta).await?;

    for record in [
        Record::new()
            .with("id", 1)
            .with("name", "Alice")
            .with("profile", serde_json::json!({"role": "admin"})),
        Record::new().with("id", 2),
    ] {
        match store.insert_row("users", &record, &meta).await {
            Ok(()) => {}
            // Rerunning the demo hits the primary key
            Err(TableStoreError::Store(e))
                if e
                    .as_database_error()
                    .is_some_and(|d| d.is_unique_violation()) =>
            {
                info!("skipping existing row: {}", e)
            }
            Err(e) => return Err(e),
        }
    }

    for row in store.read_all("users", &meta).await? {
        let mut line = Vec::new();
        for name in meta.field_names() {
            if let Some(value) = row.get(name) {
                line.push(format!("{}={:?}", name, value));
            }
        }
        println!("{}", line.join(" "));
    }

    Ok(())
}
