use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Days, NaiveTime};
use common::{OrderId, ProductId};
use domain::{CartLine, Identity, Money, Order, OrderDraft, OrderItem, OrderStatus, Product};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::query::{OrderPage, ProductPage, ReportFilter, ReportScope, page_count};
use crate::store::StorefrontStore;
use crate::{Result, StoreError};

const ORDER_COLUMNS: &str = "id, customer_name, username, email, delivery_address, placed_at, \
     order_status, admin_comment, cancelled_by_admin, cancelled_by_customer, is_deleted";

const PRODUCT_COLUMNS: &str = "id, product_name, price_cents, description, category, \
     stock_quantity, weight_or_size, pack_type, image_path, is_active, is_best_seller";

/// PostgreSQL-backed storefront store.
///
/// Every stock mutation and status transition runs inside an explicit
/// transaction with `SELECT ... FOR UPDATE` row locks, so concurrent
/// checkouts of the same product serialize on the product row and status
/// writers always see the current status before checking legality.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL storefront store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        let stock: i32 = row.try_get("stock_quantity")?;
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("product_name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            stock_quantity: stock.max(0) as u32,
            weight_or_size: row.try_get("weight_or_size")?,
            pack_type: row.try_get("pack_type")?,
            image_path: row.try_get("image_path")?,
            is_active: row.try_get("is_active")?,
            is_best_seller: row.try_get("is_best_seller")?,
        })
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status: String = row.try_get("order_status")?;
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            customer_name: row.try_get("customer_name")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            delivery_address: row.try_get("delivery_address")?,
            placed_at: row.try_get("placed_at")?,
            items,
            status: OrderStatus::parse(&status),
            admin_comment: row.try_get("admin_comment")?,
            cancelled_by_admin: row.try_get("cancelled_by_admin")?,
            cancelled_by_customer: row.try_get("cancelled_by_customer")?,
            deleted: row.try_get("is_deleted")?,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        let quantity: i32 = row.try_get("quantity")?;
        Ok(OrderItem {
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            unit_price: Money::from_cents(row.try_get("price_cents")?),
            quantity: quantity.max(0) as u32,
        })
    }

    async fn fetch_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, product_name, price_cents, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }

    /// Loads items for a batch of orders in one round trip.
    async fn fetch_items_for(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderItem>>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, product_name, price_cents, quantity
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in &rows {
            let order_id: Uuid = row.try_get("order_id")?;
            items.entry(order_id).or_default().push(Self::row_to_item(row)?);
        }
        Ok(items)
    }

    /// Loads an order under a row lock, applies a status transition, and
    /// persists the mutable fields, all in one transaction.
    ///
    /// The re-read under lock is what keeps concurrent admin/customer
    /// writers from acting on stale status.
    async fn transition<F>(&self, id: OrderId, apply: F) -> Result<Order>
    where
        F: FnOnce(&mut Order) -> std::result::Result<(), domain::OrderError> + Send,
    {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::OrderNotFound(id))?;

        let item_rows = sqlx::query(
            r#"
            SELECT product_id, product_name, price_cents, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&mut *tx)
        .await?;
        let items = item_rows
            .iter()
            .map(Self::row_to_item)
            .collect::<Result<Vec<_>>>()?;

        let mut order = Self::row_to_order(&row, items)?;
        apply(&mut order)?;

        sqlx::query(
            r#"
            UPDATE orders
            SET order_status = $2,
                admin_comment = $3,
                cancelled_by_admin = $4,
                cancelled_by_customer = $5,
                is_deleted = $6
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(order.status.as_str())
        .bind(&order.admin_comment)
        .bind(order.cancelled_by_admin)
        .bind(order.cancelled_by_customer)
        .bind(order.deleted)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }
}

#[async_trait]
impl StorefrontStore for PostgresStore {
    async fn insert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, product_name, price_cents, description, category,
                stock_quantity, weight_or_size, pack_type, image_path, is_active, is_best_seller)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.stock_quantity as i32)
        .bind(&product.weight_or_size)
        .bind(&product.pack_type)
        .bind(&product.image_path)
        .bind(product.is_active)
        .bind(product.is_best_seller)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_product(&self, product: Product) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET product_name = $2,
                price_cents = $3,
                description = $4,
                category = $5,
                stock_quantity = $6,
                weight_or_size = $7,
                pack_type = $8,
                image_path = $9,
                is_active = $10,
                is_best_seller = $11
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.stock_quantity as i32)
        .bind(&product.weight_or_size)
        .bind(&product.pack_type)
        .bind(&product.image_path)
        .bind(product.is_active)
        .bind(product.is_best_seller)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound(product.id));
        }
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn list_active_products(&self, page: u32, page_size: u32) -> Result<ProductPage> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active")
            .fetch_one(&self.pool)
            .await?;

        let offset = (page.saturating_sub(1) as i64) * page_size as i64;
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active \
             ORDER BY product_name ASC, id ASC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query(&sql)
            .bind(page_size as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let products = rows
            .iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?;

        Ok(ProductPage {
            products,
            page,
            total_pages: page_count(total.max(0) as u64, page_size),
        })
    }

    async fn deactivate_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("UPDATE products SET is_active = FALSE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn credit_stock(&self, id: ProductId, quantity: u32) -> Result<()> {
        let result = sqlx::query(
            "UPDATE products SET stock_quantity = stock_quantity + $2 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(quantity as i32)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProductNotFound(id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, draft), fields(username = %draft.customer.username))]
    async fn place_order(&self, draft: OrderDraft) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        // Lock product rows in a stable order so two checkouts touching the
        // same products cannot deadlock, and validate against the locked
        // stock. Name and price snapshots come from the locked rows, not
        // from the cart.
        let mut lock_order: Vec<&CartLine> = draft.lines.iter().collect();
        lock_order.sort_by_key(|l| l.product_id);

        let mut snapshots: HashMap<ProductId, (String, i64)> = HashMap::new();
        for line in lock_order {
            let row = sqlx::query(
                "SELECT product_name, price_cents, stock_quantity FROM products \
                 WHERE id = $1 FOR UPDATE",
            )
            .bind(line.product_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;

            let Some(row) = row else {
                // A vanished product surfaces the same way the original
                // storefront reports it: not enough stock for that line.
                return Err(StoreError::InsufficientStock {
                    product_name: line.product_name.clone(),
                    available: 0,
                });
            };

            let name: String = row.try_get("product_name")?;
            let price_cents: i64 = row.try_get("price_cents")?;
            let stock: i32 = row.try_get("stock_quantity")?;

            if line.quantity > stock.max(0) as u32 {
                return Err(StoreError::InsufficientStock {
                    product_name: name,
                    available: stock.max(0) as u32,
                });
            }

            snapshots.insert(line.product_id, (name, price_cents));
        }

        // Build the order in cart order, with frozen snapshots.
        let items: Vec<OrderItem> = draft
            .lines
            .iter()
            .map(|line| {
                let (name, price_cents) = snapshots
                    .get(&line.product_id)
                    .cloned()
                    .unwrap_or_else(|| (line.product_name.clone(), line.unit_price.cents()));
                OrderItem::new(
                    line.product_id,
                    name,
                    Money::from_cents(price_cents),
                    line.quantity,
                )
            })
            .collect();

        let order = Order {
            id: OrderId::new(),
            customer_name: draft.customer.name.clone(),
            username: draft.customer.username.clone(),
            email: draft.customer.email.clone(),
            delivery_address: draft.delivery_address.clone(),
            placed_at: chrono::Utc::now(),
            items,
            status: OrderStatus::Pending,
            admin_comment: None,
            cancelled_by_admin: false,
            cancelled_by_customer: false,
            deleted: false,
        };

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_name, username, email, delivery_address,
                placed_at, order_status, cancelled_by_admin, cancelled_by_customer, is_deleted)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.customer_name)
        .bind(&order.username)
        .bind(&order.email)
        .bind(&order.delivery_address)
        .bind(order.placed_at)
        .bind(order.status.as_str())
        .bind(order.cancelled_by_admin)
        .bind(order.cancelled_by_customer)
        .bind(order.deleted)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, product_name, price_cents, quantity)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(&item.product_name)
            .bind(item.unit_price.cents())
            .bind(item.quantity as i32)
            .execute(&mut *tx)
            .await?;

            // Debit the validated quantity; a product that reaches zero is
            // taken off the storefront.
            sqlx::query(
                r#"
                UPDATE products
                SET stock_quantity = stock_quantity - $2,
                    is_active = CASE WHEN stock_quantity - $2 <= 0 THEN FALSE ELSE is_active END
                WHERE id = $1
                "#,
            )
            .bind(item.product_id.as_uuid())
            .bind(item.quantity as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let items = self.fetch_items(id).await?;
                Ok(Some(Self::row_to_order(&row, items)?))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self, actor), fields(username = %actor.username))]
    async fn cancel_order(&self, id: OrderId, actor: &Identity) -> Result<Order> {
        self.transition(id, |order| order.cancel(actor)).await
    }

    #[tracing::instrument(skip(self))]
    async fn approve_order(&self, id: OrderId) -> Result<Order> {
        self.transition(id, |order| order.approve()).await
    }

    #[tracing::instrument(skip(self, comment))]
    async fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        comment: Option<String>,
    ) -> Result<Order> {
        self.transition(id, |order| order.set_status(status, comment))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_order(&self, id: OrderId) -> Result<Order> {
        self.transition(id, |order| order.soft_delete()).await
    }

    async fn order_reports(
        &self,
        scope: &ReportScope,
        filter: &ReportFilter,
        page: u32,
        page_size: u32,
    ) -> Result<OrderPage> {
        // Total pages come from the role-scoped, unfiltered count.
        let total: i64 = match scope {
            ReportScope::Admin => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE is_deleted = FALSE")
                    .fetch_one(&self.pool)
                    .await?
            }
            ReportScope::Customer(username) => sqlx::query_scalar(
                "SELECT COUNT(*) FROM orders WHERE is_deleted = FALSE AND username = $1",
            )
            .bind(username)
            .fetch_one(&self.pool)
            .await?,
        };

        let mut sql =
            format!("SELECT {ORDER_COLUMNS} FROM orders WHERE is_deleted = FALSE");
        let mut param_count = 0;

        if matches!(scope, ReportScope::Customer(_)) {
            param_count += 1;
            sql.push_str(&format!(" AND username = ${param_count}"));
        }
        if filter.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND LOWER(order_status) = LOWER(${param_count})"));
        }
        let name_filter = match scope {
            ReportScope::Admin => filter.customer_name.as_deref(),
            ReportScope::Customer(_) => None,
        };
        if name_filter.is_some() {
            param_count += 1;
            sql.push_str(&format!(
                " AND customer_name ILIKE '%' || ${param_count} || '%'"
            ));
        }
        if filter.from_date.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND placed_at >= ${param_count}"));
        }
        if filter.to_date.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND placed_at < ${param_count}"));
        }

        sql.push_str(" ORDER BY placed_at DESC, id DESC");
        param_count += 1;
        sql.push_str(&format!(" LIMIT ${param_count}"));
        param_count += 1;
        sql.push_str(&format!(" OFFSET ${param_count}"));

        let mut sqlx_query = sqlx::query(&sql);

        if let ReportScope::Customer(username) = scope {
            sqlx_query = sqlx_query.bind(username);
        }
        if let Some(status) = filter.status {
            sqlx_query = sqlx_query.bind(status.as_str());
        }
        if let Some(name) = name_filter {
            sqlx_query = sqlx_query.bind(name);
        }
        if let Some(from) = filter.from_date {
            sqlx_query = sqlx_query.bind(from.and_time(NaiveTime::MIN).and_utc());
        }
        if let Some(to) = filter.to_date {
            // Inclusive end-of-day: compare strictly before the next day.
            sqlx_query = sqlx_query.bind((to + Days::new(1)).and_time(NaiveTime::MIN).and_utc());
        }

        let offset = (page.saturating_sub(1) as i64) * page_size as i64;
        sqlx_query = sqlx_query.bind(page_size as i64).bind(offset);

        let rows = sqlx_query.fetch_all(&self.pool).await?;

        let order_ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<_, _>>()?;
        let mut items_by_order = self.fetch_items_for(&order_ids).await?;

        let orders = rows
            .iter()
            .map(|row| {
                let id: Uuid = row.try_get("id")?;
                let items = items_by_order.remove(&id).unwrap_or_default();
                Self::row_to_order(row, items)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(OrderPage {
            orders,
            page,
            total_pages: page_count(total.max(0) as u64, page_size),
        })
    }
}
