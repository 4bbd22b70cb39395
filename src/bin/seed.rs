//! Fills a development database with active users, posts, comments and
//! follow edges. Re-running reuses the same users and adds more content.
//!
//! `DATABASE_URL` selects the database; every seeded user logs in with
//! `SEED_PASSWORD` (default `password123`).

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use rand::{rngs::OsRng, seq::SliceRandom, Rng};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;
use uuid::Uuid;

const USERS: &[(&str, &str)] = &[
    ("john_doe", "john.doe@example.com"),
    ("jane_smith", "jane.smith@example.com"),
    ("mike_jones", "mike.jones@example.com"),
    ("sarah_wilson", "sarah.wilson@example.com"),
    ("david_brown", "david.brown@example.com"),
    ("emily_taylor", "emily.taylor@example.com"),
    ("chris_miller", "chris.miller@example.com"),
    ("lisa_anderson", "lisa.anderson@example.com"),
    ("alex_thomas", "alex.thomas@example.com"),
    ("amy_roberts", "amy.roberts@example.com"),
];

const TITLES: &[&str] = &[
    "Exploring async Rust",
    "Web development habits that stick",
    "A gentle start with machine learning",
    "Designing distributed systems",
    "Picking a frontend framework",
    "Database tuning tips",
    "Microservices in practice",
    "A tour of DevOps tooling",
    "Cloud native application basics",
    "API design principles",
];

const CONTENTS: &[&str] = &[
    "A walk through the core ideas with small, runnable examples.",
    "Notes from a recent project, including what went wrong.",
    "Practical solutions to problems that show up in real codebases.",
    "Where the ecosystem is heading and what to learn next.",
    "From first principles to production, step by step.",
    "Measuring before optimizing, and the tools that help.",
];

const TAGS: &[&str] = &[
    "rust", "go", "web", "database", "devops", "cloud", "security", "ml", "frontend", "api",
];

const COMMENTS: &[&str] = &[
    "Great write-up, thanks!",
    "This cleared up a lot for me.",
    "Do you have a follow-up planned?",
    "I ran into the same issue last week.",
    "Bookmarked.",
    "Interesting take, I see it differently though.",
];

const POSTS: usize = 200;
const COMMENTS_TOTAL: usize = 500;
const FOLLOWS_PER_USER: usize = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "seed=info".into()))
        .init();

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .context("connecting to database")?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let password = std::env::var("SEED_PASSWORD").unwrap_or_else(|_| "password123".into());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map_err(|e| anyhow::anyhow!("hashing seed password: {e}"))?
        .to_string();

    let users = seed_users(&pool, &hash).await?;
    let posts = seed_posts(&pool, &users).await?;
    seed_comments(&pool, &users, &posts).await?;
    seed_follows(&pool, &users).await?;

    info!(
        users = users.len(),
        posts = posts.len(),
        comments = COMMENTS_TOTAL,
        "seeding complete"
    );
    Ok(())
}

async fn seed_users(pool: &PgPool, hash: &str) -> anyhow::Result<Vec<Uuid>> {
    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(USERS.len());
    for &(username, email) in USERS {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (username, email, password_hash, role_id, is_active)
            VALUES ($1, $2, $3, (SELECT id FROM roles WHERE name = 'user'), TRUE)
            ON CONFLICT (username) DO UPDATE SET is_active = TRUE
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(hash)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("inserting user {username}"))?;
        ids.push(id);
    }
    tx.commit().await?;
    info!(count = ids.len(), "users ready");
    Ok(ids)
}

async fn seed_posts(pool: &PgPool, users: &[Uuid]) -> anyhow::Result<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(POSTS);
    for _ in 0..POSTS {
        let (author, title, content, tags) = {
            let mut rng = rand::thread_rng();
            let n_tags = rng.gen_range(1..=3);
            let tags: Vec<String> = TAGS
                .choose_multiple(&mut rng, n_tags)
                .map(|t| t.to_string())
                .collect();
            (
                pick(&mut rng, users)?,
                pick(&mut rng, TITLES)?,
                pick(&mut rng, CONTENTS)?,
                tags,
            )
        };
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO posts (user_id, title, content, tags)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(author)
        .bind(title)
        .bind(content)
        .bind(&tags)
        .fetch_one(pool)
        .await?;
        ids.push(id);
    }
    info!(count = ids.len(), "posts inserted");
    Ok(ids)
}

async fn seed_comments(pool: &PgPool, users: &[Uuid], posts: &[Uuid]) -> anyhow::Result<()> {
    for _ in 0..COMMENTS_TOTAL {
        let (post, author, content) = {
            let mut rng = rand::thread_rng();
            (
                pick(&mut rng, posts)?,
                pick(&mut rng, users)?,
                pick(&mut rng, COMMENTS)?,
            )
        };
        sqlx::query("INSERT INTO comments (post_id, user_id, content) VALUES ($1, $2, $3)")
            .bind(post)
            .bind(author)
            .bind(content)
            .execute(pool)
            .await?;
    }
    info!(count = COMMENTS_TOTAL, "comments inserted");
    Ok(())
}

async fn seed_follows(pool: &PgPool, users: &[Uuid]) -> anyhow::Result<()> {
    let mut edges = 0u64;
    for follower in users {
        let followed: Vec<Uuid> = {
            let mut rng = rand::thread_rng();
            users
                .iter()
                .filter(|u| *u != follower)
                .copied()
                .collect::<Vec<_>>()
                .choose_multiple(&mut rng, FOLLOWS_PER_USER)
                .copied()
                .collect()
        };
        for user in followed {
            let res = sqlx::query(
                r#"
                INSERT INTO followers (user_id, follower_id) VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(user)
            .bind(follower)
            .execute(pool)
            .await?;
            edges += res.rows_affected();
        }
    }
    info!(count = edges, "follow edges inserted");
    Ok(())
}

fn pick<T: Copy>(rng: &mut impl Rng, items: &[T]) -> anyhow::Result<T> {
    items.choose(rng).copied().context("nothing to pick from")
}
