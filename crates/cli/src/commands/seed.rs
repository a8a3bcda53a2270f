//! Seed the database with sample community content.
//!
//! Creates (or reuses) a demo account holding both roles, then inserts a
//! handful of upcoming events and product listings owned by it. Collections
//! that already hold documents are left alone, so the command can be re-run.

use chrono::{Days, NaiveTime, Utc};
use thiserror::Error;
use tracing::info;

use nagar_core::{Email, EmailError, Price, PriceError, RegistrationRole, UserId};
use nagar_portal::db::{
    AccountStore, EventStore, PgDocumentStore, ProductStore, RepositoryError, UserStore,
};
use nagar_portal::models::{NewEvent, NewProduct, UserProfile};
use nagar_portal::services::{AuthError, AuthService};

use super::{ConnectError, connect};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Invalid sample price: {0}")]
    Price(#[from] PriceError),

    #[error("Sample event date out of range")]
    DateOutOfRange,
}

/// Sample event: title, description, days from today, start time, location.
const SAMPLE_EVENTS: &[(&str, &str, u64, Option<(u32, u32)>, &str)] = &[
    (
        "Neighbourhood Clean-up Drive",
        "Gloves and bags provided. Meet at the park gate.",
        3,
        Some((7, 30)),
        "Gandhi Park",
    ),
    (
        "Weekend Farmers Market",
        "Fresh produce from growers around the city.",
        6,
        Some((9, 0)),
        "Community Hall Grounds",
    ),
    (
        "Startup Meetup",
        "Local founders share what they are building. Open to everyone.",
        13,
        Some((18, 0)),
        "Public Library, Room 2",
    ),
];

/// Sample product: name, description, price, seller name, phone.
const SAMPLE_PRODUCTS: &[(&str, &str, &str, &str, &str)] = &[
    (
        "Handmade Clay Diya Set",
        "Set of six painted diyas.",
        "150",
        "Meera Crafts",
        "+91 98765 43210",
    ),
    (
        "Organic Turmeric Powder",
        "500 g, stone ground.",
        "75",
        "Green Roots Farm",
        "+91 91234 56780",
    ),
    (
        "Block Print Cotton Tote",
        "Hand block printed, reusable.",
        "299.50",
        "Rangrez Studio",
        "+91 99887 66554",
    ),
];

/// Seed demo events and products.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the demo account
/// cannot be created.
pub async fn demo(email: &str, password: &str) -> Result<(), SeedError> {
    let store = PgDocumentStore::new(connect().await?);
    let owner = demo_account(&store, email, password).await?;

    let events = seed_events(&store, owner).await?;
    let products = seed_products(&store, owner, email).await?;

    info!("Seeding complete!");
    info!("  Events inserted: {events}");
    info!("  Products inserted: {products}");
    Ok(())
}

/// Find or register the demo account and give it both roles.
async fn demo_account(
    store: &PgDocumentStore,
    email: &str,
    password: &str,
) -> Result<UserId, SeedError> {
    let parsed = Email::normalized(email)?;

    let (id, email) = if let Some(account) = store.find_account_by_email(&parsed).await? {
        info!(user_id = %account.id, "Reusing demo account");
        (account.id, account.email)
    } else {
        let user = AuthService::new(store)
            .register(email, password, RegistrationRole::Entrepreneur)
            .await?;
        info!(user_id = %user.id, "Created demo account");
        (user.id, user.email)
    };

    store
        .put_user_profile(&UserProfile {
            id,
            email,
            is_admin: true,
            is_entrepreneur: true,
            created_at: Utc::now(),
        })
        .await?;

    Ok(id)
}

async fn seed_events(store: &PgDocumentStore, owner: UserId) -> Result<usize, SeedError> {
    if !store.list_events().await?.is_empty() {
        info!("Events already present, skipping");
        return Ok(0);
    }

    let today = Utc::now().date_naive();
    for &(title, description, days, time, location) in SAMPLE_EVENTS {
        let date = today
            .checked_add_days(Days::new(days))
            .ok_or(SeedError::DateOutOfRange)?;
        store
            .insert_event(NewEvent {
                title: title.to_owned(),
                description: description.to_owned(),
                date,
                time: time.and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0)),
                location: Some(location.to_owned()),
                form_link: None,
                image_url: None,
                created_by: owner,
            })
            .await?;
    }

    Ok(SAMPLE_EVENTS.len())
}

async fn seed_products(
    store: &PgDocumentStore,
    owner: UserId,
    seller_email: &str,
) -> Result<usize, SeedError> {
    if !store.list_products().await?.is_empty() {
        info!("Products already present, skipping");
        return Ok(0);
    }

    for &(name, description, price, seller_name, phone) in SAMPLE_PRODUCTS {
        store
            .insert_product(NewProduct {
                name: name.to_owned(),
                description: description.to_owned(),
                price: Price::parse(price)?,
                image_url: None,
                seller_name: seller_name.to_owned(),
                seller_contact: Some(phone.to_owned()),
                seller_email: Some(seller_email.to_owned()),
                seller_id: owner,
            })
            .await?;
    }

    Ok(SAMPLE_PRODUCTS.len())
}
