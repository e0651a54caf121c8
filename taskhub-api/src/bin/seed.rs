//! # TaskHub seeder
//!
//! Wipes the configured database and loads a small demo data set: three
//! users and three tasks, one of them shared with two collaborators.
//!
//! ```bash
//! cargo run -p taskhub-api --bin taskhub-seed
//! ```

use taskhub_api::{config::Config, telemetry};
use taskhub_shared::{
    auth::credentials::{register, SignupRequest},
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool},
        PgStore,
    },
    models::{
        task::{CreateTask, TaskPriority, TaskStatus},
        user::User,
    },
    store::TaskStore,
};

const USERS: [(&str, &str, &str); 3] = [
    ("adminuser", "admin@admin.com", "#Adm1n123"),
    ("ladetest1", "ladetest1@example.com", "#Passw0rd"),
    ("ladetest2", "ladetest2@example.com", "#Passw0rd"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init_tracing(config.log_format)?;

    let pool = create_pool(config.pool_config()).await?;
    run_migrations(&pool).await?;
    tracing::info!("Connected to the database");

    let store = PgStore::new(pool.clone());

    tracing::info!("Wiping database clean");
    store.wipe().await?;

    tracing::info!("Creating users");
    let mut users: Vec<User> = Vec::with_capacity(USERS.len());
    for (username, email, password) in USERS {
        let user = register(
            &store,
            SignupRequest {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                password_confirmation: password.to_string(),
            },
        )
        .await?;
        users.push(user);
    }

    let (admin, first, second) = (&users[0], &users[1], &users[2]);

    tracing::info!("Creating tasks");
    let tasks = [
        CreateTask {
            owner_id: admin.id,
            name: "Finish lab exercise".to_string(),
            status: TaskStatus::Todo,
            priority: TaskPriority::P1,
            is_completed: false,
            collaborators: vec![],
        },
        CreateTask {
            owner_id: admin.id,
            name: "Handle GET requests".to_string(),
            status: TaskStatus::Done,
            priority: TaskPriority::P3,
            is_completed: false,
            collaborators: vec![first.id, second.id],
        },
        CreateTask {
            owner_id: first.id,
            name: "Handle POST requests".to_string(),
            status: TaskStatus::InProgress,
            priority: TaskPriority::P3,
            is_completed: false,
            collaborators: vec![],
        },
    ];

    // The store links each task to its owner and collaborators
    for data in tasks {
        let task = store.create_task(data).await?;
        tracing::info!(task_id = %task.id, name = %task.name, "Task created");
    }

    close_pool(pool).await;
    tracing::info!("Seeding complete");

    Ok(())
}
