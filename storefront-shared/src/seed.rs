/// Bootstrap data for a fresh database
///
/// [`bootstrap`] is safe to run any number of times. Roles are ensured on
/// every run; demo users are only created while the `users` table is empty
/// and demo products only while `products` is empty.
///
/// # Example
///
/// ```no_run
/// use storefront_shared::seed::bootstrap;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let report = bootstrap(&pool).await?;
/// println!("created {} users, {} products", report.users_created, report.products_created);
/// # Ok(())
/// # }
/// ```

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::auth::authorization::{BUILTIN_ROLES, ROLE_ADMIN, ROLE_USER};
use crate::auth::password::{hash_password, PasswordError};
use crate::models::product::{Product, ProductInput};
use crate::models::role::Role;
use crate::models::user::{CreateUser, User};

/// Error type for seeding
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Database error while seeding: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Could not hash seed password: {0}")]
    Password(#[from] PasswordError),
}

/// What a bootstrap run changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub roles_ensured: usize,
    pub users_created: usize,
    pub products_created: usize,
}

struct DemoUser {
    email: &'static str,
    password: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    role: &'static str,
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        email: "admin@gmail.com",
        password: "AdminPassword123!",
        first_name: "Admin",
        last_name: "Admin",
        role: ROLE_ADMIN,
    },
    DemoUser {
        email: "testuser1@gmail.com",
        password: "TestUserPassword123!",
        first_name: "Test1",
        last_name: "User",
        role: ROLE_USER,
    },
    DemoUser {
        email: "testuser2@gmail.com",
        password: "TestUserPassword123!",
        first_name: "Test2",
        last_name: "User",
        role: ROLE_USER,
    },
];

struct DemoProduct {
    name: &'static str,
    description: &'static str,
    /// Whole currency units
    price: i64,
    image: &'static str,
    yield_rating: i32,
    specs: &'static str,
}

impl DemoProduct {
    fn input(&self) -> ProductInput {
        ProductInput {
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            price: Decimal::new(self.price * 100, 2),
            image_url: Some(format!("/assets/images/{}", self.image)),
            yield_rating: self.yield_rating,
            specs: Some(self.specs.to_string()),
        }
    }
}

const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        name: "Atomic Annihilator",
        description: "For those who want to really make an impact...",
        price: 10000,
        image: "atomic_annihilator.png",
        yield_rating: 50000,
        specs: "Proprietary fusion ignition system...",
    },
    DemoProduct {
        name: "Fission Fiesta",
        description: "Looking for a way to spice up your outdoor party? Look no further than our Fission Fiesta. With a rainbow of radioactive colors, this bomb will light up the sky and keep the party going all night long.",
        price: 2000,
        image: "fission_fiesta.png",
        yield_rating: 100,
        specs: "Advanced fission technology for maximum boom potential; Ergonomic handle for comfortable carrying...",
    },
    DemoProduct {
        name: "Fusion Frenzy",
        description: "It's like a party in a bomb, with all the bells and whistles you'd expect from a good nuclear explosion. Get ready to feel the heat!",
        price: 1000,
        image: "fusion_frenzy.png",
        yield_rating: 50,
        specs: "Advanced fusion technology for maximum boom potential; Explosively stylish design...",
    },
    DemoProduct {
        name: "Nuke-A-Loo",
        description: "This bomb is like a dance party, except it will level entire cities in its wake. So put on your dancing shoes and run for cover!",
        price: 4500,
        image: "nuke_a_loo.png",
        yield_rating: 1200,
        specs: "Carbon-fiber reinforced casing for durability; Customizable yield settings...",
    },
    DemoProduct {
        name: "Plutonium Pizzazz",
        description: "This bomb has style and flair, with a little bit of extra radioactive punch. It's perfect for when you want to make a statement and leave an impact.",
        price: 400,
        image: "plutonium_pizzazz.png",
        yield_rating: 25,
        specs: "Contains 100% explosive energy; Guaranteed to leave a lasting impression...",
    },
    DemoProduct {
        name: "Radioactive Razzle Dazzle",
        description: "This bomb creates a dazzling light show that will leave you in awe. But beware, the after-effects may be less than desirable.",
        price: 3500,
        image: "radioactive_razzle.png",
        yield_rating: 500,
        specs: "Bomb-licious design; Guaranteed to leave your enemies glowing with envy...",
    },
    DemoProduct {
        name: "Isotope Ice Cream",
        description: "Chill out with this refreshing treat. It's the perfect way to beat the heat on a hot summer day. Warning: do not eat.",
        price: 125,
        image: "isotope_ice_cream.png",
        yield_rating: 10,
        specs: "It may look small, but packs a serious punch; Warning: May cause sudden urge to yell 'Boom!'...",
    },
    DemoProduct {
        name: "Gamma Gallop",
        description: "Unleash this bad boy on your enemies and watch as they run for the hills. This bomb packs a serious punch and is sure to leave a lasting impression.",
        price: 750,
        image: "gamma_gallop.png",
        yield_rating: 40,
        specs: "For those times when diplomacy just isn't enough; Because sometimes you just need a nuclear explosion...",
    },
    DemoProduct {
        name: "Meltdown Muffin",
        description: "Guaranteed to give you a warm, toasty feeling inside. It's the perfect pick-me-up on a cold, dark day. Its explosive power is enough to warm up even the coldest of hearts, and leave a toasty feeling that lasts for miles around.",
        price: 8000,
        image: "meltdown_muffin.png",
        yield_rating: 5000,
        specs: "Just like grandma used to make, except with a lot more radiation; Unleash the power of a thousand suns...",
    },
    DemoProduct {
        name: "Uranium Unicorn",
        description: "This magical bomb will transport you to a world of pure, radioactive delight. Don't let its cute exterior fool you, it packs a powerful punch!",
        price: 1250,
        image: "uranium_unicorn.png",
        yield_rating: 85,
        specs: "For those days when a simple bomb just won't cut it; Guaranteed to leave an impact that will last for centuries...",
    },
];

/// Ensures built-in roles and inserts demo data into empty tables
pub async fn bootstrap(pool: &PgPool) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    for role in BUILTIN_ROLES {
        Role::ensure_exists(pool, role).await?;
        report.roles_ensured += 1;
    }

    if User::count(pool).await? == 0 {
        for demo in DEMO_USERS {
            let user = User::create_with_roles(
                pool,
                CreateUser {
                    email: demo.email.to_string(),
                    password_hash: hash_password(demo.password)?,
                    first_name: Some(demo.first_name.to_string()),
                    last_name: Some(demo.last_name.to_string()),
                },
                &[demo.role],
            )
            .await?;
            debug!(user_id = %user.id, email = %user.email, role = demo.role, "Seeded user");
            report.users_created += 1;
        }
    } else {
        debug!("Users already present, skipping demo users");
    }

    if Product::count(pool).await? == 0 {
        for demo in DEMO_PRODUCTS {
            Product::create(pool, demo.input()).await?;
            report.products_created += 1;
        }
    } else {
        debug!("Products already present, skipping demo catalogue");
    }

    info!(
        roles_ensured = report.roles_ensured,
        users_created = report.users_created,
        products_created = report.products_created,
        "Bootstrap seeding finished"
    );

    Ok(report)
}
