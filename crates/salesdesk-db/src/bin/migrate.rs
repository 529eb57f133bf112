use salesdesk_db::{connect_postgres, migrate};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let db_url = std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;
    let pool = connect_postgres(&db_url).await?;
    migrate(&pool).await?;
    Ok(())
}
