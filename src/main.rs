use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info};

use hospital_ops::config::{DatabaseConfig, EnvironmentConfig};
use hospital_ops::database::DatabaseConnection;
use hospital_ops::routes::create_app;
use hospital_ops::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .init();

    info!("🚑 Hospital Ops - API de solicitudes de ambulancia");
    info!("==================================================");
    info!("🌍 Entorno: {}", config.environment);

    // Inicializar base de datos
    let db_connection = match DatabaseConnection::connect(&DatabaseConfig::new(&config.database_url)).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {:#}", e);
            return Err(e);
        }
    };

    let addr = config.server_url();
    let app = create_app(AppState::new(db_connection.pool().clone(), config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("🔐 Autenticación:");
    info!("   POST /api/auth/register - Registrar usuario");
    info!("   POST /api/auth/login - Login");
    info!("   POST /api/auth/forgot-password - Solicitar reseteo de contraseña");
    info!("   POST /api/auth/reset-password - Resetear contraseña");
    info!("   GET  /api/auth/me - Sesión actual");
    info!("🚑 Solicitudes de ambulancia:");
    info!("   GET  /api/ambulance - Listar solicitudes (search, status, priority)");
    info!("   POST /api/ambulance - Crear solicitud");
    info!("   GET  /api/ambulance/:id - Obtener solicitud");
    info!("   PUT  /api/ambulance/:id - Editar solicitud pendiente");
    info!("   POST /api/ambulance/:id/assign - Asignarme la solicitud");
    info!("   PUT  /api/ambulance/:id/status - Actualizar estado");
    info!("   POST /api/ambulance/:id/forward - Reenviar a hospital");
    info!("   GET  /api/ambulance/hospital/forwarded-requests - Solicitudes reenviadas");
    info!("   POST /api/ambulance/:id/hospital-response - Aceptar o rechazar");
    info!("   POST /api/ambulance/:id/mark-read - Marcar como leída");
    info!("🏥 Flota del hospital:");
    info!("   GET  /api/hospital/ambulances - Listar ambulancias");
    info!("   POST /api/hospital/ambulances - Añadir ambulancia");
    info!("   GET  /api/hospital/ambulances/:id - Obtener ambulancia");
    info!("   PUT  /api/hospital/ambulances/:id - Editar ambulancia");
    info!("   DELETE /api/hospital/ambulances/:id - Eliminar ambulancia");
    info!("   POST /api/hospital/ambulances/:id/park - Aparcar ambulancia");
    info!("   POST /api/hospital/ambulances/:id/assign/:request_id - Asignar a solicitud");
    info!("🔔 Notificaciones:");
    info!("   GET  /api/notifications - Listar notificaciones");
    info!("   POST /api/notifications/:id/read - Marcar como leída");
    info!("   POST /api/notifications/mark-all-read - Marcar todas como leídas");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
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
