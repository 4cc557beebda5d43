use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use vehicle_rental::config::database::{mask_database_url, DatabaseConfig};
use vehicle_rental::config::environment::{EnvironmentConfig, StorageBackend};
use vehicle_rental::repositories::{InMemoryStore, Repositories};
use vehicle_rental::routes::create_router;
use vehicle_rental::services::LogNotifier;
use vehicle_rental::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    let default_filter = if config.is_development() {
        "vehicle_rental=debug,tower_http=debug"
    } else {
        "vehicle_rental=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    info!("🚗 Vehicle Rental API ({})", config.environment);
    info!("================================================");

    // Inicializar almacenamiento
    let repositories = match config.storage {
        StorageBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            info!("🐘 Conectando a {}", mask_database_url(&db_config.url));

            let pool = match db_config.create_pool().await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow::anyhow!("Error de base de datos: {}", e));
                }
            };

            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("✅ Migraciones aplicadas");

            Repositories::postgres(pool)
        }
        StorageBackend::Memory => {
            warn!("⚠️ Usando almacenamiento en memoria: los datos se pierden al reiniciar");
            Repositories::in_memory(Arc::new(InMemoryStore::new()))
        }
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let app_state = AppState::new(config, repositories, Arc::new(LogNotifier));
    let app = create_router(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🚗 Vehículos:");
    info!("   GET  /api/vehicles - Listar vehículos");
    info!("   GET  /api/vehicles/:id - Obtener vehículo");
    info!("   POST /api/vehicles - Crear vehículo");
    info!("   GET  /api/vehicles/mine - Mis vehículos");
    info!("   PUT  /api/vehicles/:id - Actualizar vehículo");
    info!("   DELETE /api/vehicles/:id - Eliminar vehículo");
    info!("📅 Reservas:");
    info!("   POST /api/bookings - Solicitar reserva");
    info!("   GET  /api/bookings - Mis reservas");
    info!("   GET  /api/bookings/:id - Obtener reserva");
    info!("   PATCH /api/bookings/:id/{{accept,reject,complete,cancel,notes}}");
    info!("💬 Mensajes:");
    info!("   GET|POST /api/messages/:booking_id");
    info!("⭐ Reviews:");
    info!("   POST /api/reviews - Publicar review");
    info!("   GET  /api/reviews/merchant/:merchant_id - Reviews de un merchant");
    info!("🪪 Usuarios:");
    info!("   GET  /api/users/me");
    info!("   POST /api/users/license");
    info!("   GET  /api/users/licenses/pending");
    info!("   PATCH /api/users/:id/license");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
