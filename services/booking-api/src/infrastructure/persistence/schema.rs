//! 数据库 schema 迁移

use manikura_adapter_postgres::Migration;

/// 全部迁移，按版本升序
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "create_users",
            r#"
            CREATE TABLE users (
                id BIGSERIAL PRIMARY KEY,
                email VARCHAR(254) NOT NULL UNIQUE,
                name VARCHAR(255) NOT NULL,
                phone VARCHAR(32) NOT NULL DEFAULT '',
                is_professional BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        ),
        Migration::new(
            2,
            "create_salons",
            r#"
            CREATE TABLE salons (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                description TEXT NOT NULL,
                address VARCHAR(255) NOT NULL,
                city VARCHAR(128) NOT NULL,
                phone VARCHAR(32) NOT NULL,
                email VARCHAR(254) NOT NULL,
                rating DOUBLE PRECISION NOT NULL DEFAULT 0,
                total_reviews INTEGER NOT NULL DEFAULT 0,
                price_range VARCHAR(16) NOT NULL,
                image_url VARCHAR(512),
                open_time TIME NOT NULL,
                close_time TIME NOT NULL,
                owner_id BIGINT REFERENCES users(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX idx_salons_city ON salons (city);
            CREATE INDEX idx_salons_rating ON salons (rating DESC)
            "#,
        ),
        Migration::new(
            3,
            "create_reservations",
            r#"
            CREATE TABLE reservations (
                id BIGSERIAL PRIMARY KEY,
                salon_id BIGINT NOT NULL REFERENCES salons(id),
                client_id BIGINT NOT NULL REFERENCES users(id),
                service_type VARCHAR(128) NOT NULL,
                appointment_date TIMESTAMPTZ NOT NULL,
                duration_minutes INTEGER NOT NULL DEFAULT 60,
                price DOUBLE PRECISION NOT NULL,
                status VARCHAR(16) NOT NULL DEFAULT 'confirmed',
                payment_status VARCHAR(16) NOT NULL DEFAULT 'pending',
                checkout_session_id VARCHAR(255),
                stripe_payment_id VARCHAR(255),
                client_notes TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX idx_reservations_salon_date ON reservations (salon_id, appointment_date);
            CREATE UNIQUE INDEX idx_reservations_checkout_session
                ON reservations (checkout_session_id)
                WHERE checkout_session_id IS NOT NULL;
            CREATE INDEX idx_reservations_payment ON reservations (stripe_payment_id)
            "#,
        ),
        // 同沙龙未取消预约的时段互斥，并发请求由存储层兜底。
        // 索引表达式必须 IMMUTABLE：先经 timezone('UTC', ...) 转为 timestamp
        Migration::new(
            4,
            "reservations_no_overlap",
            r#"
            CREATE EXTENSION IF NOT EXISTS btree_gist;
            ALTER TABLE reservations ADD CONSTRAINT reservations_no_overlap
                EXCLUDE USING gist (
                    salon_id WITH =,
                    tsrange(
                        timezone('UTC', appointment_date),
                        timezone('UTC', appointment_date) + make_interval(mins => duration_minutes)
                    ) WITH &&
                )
                WHERE (status <> 'cancelled')
            "#,
        ),
    ]
}
