use async_trait::async_trait;
use sqlx::error::Error;

use super::QueryResult;
use crate::{
    dao::SubscriptionStore,
    model::{Cursors, NewSubscription, Subscription, Table},
};

impl Table<Subscription> {
    /// Registers a device, or updates the row already owned by `jwt`.
    pub async fn upsert(
        &self,
        subscription: &NewSubscription,
    ) -> Result<Subscription, Error> {
        sqlx::query_as(
            r#"
            INSERT INTO account_notification (type, token, jwt, instance)
            VALUES($1, $2, $3, $4)
            ON CONFLICT (jwt) DO UPDATE SET
                type = EXCLUDED.type,
                token = EXCLUDED.token,
                instance = EXCLUDED.instance,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(subscription.channel_type.to_string())
        .bind(&subscription.token)
        .bind(&subscription.jwt)
        .bind(&subscription.instance)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get_all(&self) -> Result<Vec<Subscription>, Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM account_notification ORDER BY instance, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_by_token(
        &self,
        token: &str,
    ) -> Result<Vec<Subscription>, Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM account_notification WHERE token=$1 ORDER BY id
            "#,
        )
        .bind(token)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn set_cursors(
        &self,
        id: i32,
        cursors: Cursors,
        test_sent: bool,
    ) -> Result<QueryResult, Error> {
        sqlx::query(
            r#"
            UPDATE account_notification
            SET
                last_reply_id = $2,
                last_mention_id = $3,
                last_message_id = $4,
                test = CASE WHEN $5 THEN false ELSE test END,
                updated_at = now()
            WHERE id=$1
            "#,
        )
        .bind(id)
        .bind(cursors.reply)
        .bind(cursors.mention)
        .bind(cursors.message)
        .bind(test_sent)
        .execute(&self.pool)
        .await
    }

    pub async fn queue_test(&self, jwt: &str) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE account_notification SET test = true, updated_at = now() WHERE jwt=$1
            "#,
        )
        .bind(jwt)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_by_jwts(&self, jwts: &[String]) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM account_notification WHERE jwt = ANY($1)
            "#,
        )
        .bind(jwts)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_by_token(&self, token: &str) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM account_notification WHERE token=$1
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SubscriptionStore for Table<Subscription> {
    async fn list_all(&self) -> Result<Vec<Subscription>, crate::error::Error> {
        Ok(self.get_all().await?)
    }

    async fn update_cursors(
        &self,
        id: i32,
        cursors: Cursors,
        test_sent: bool,
    ) -> Result<(), crate::error::Error> {
        self.set_cursors(id, cursors, test_sent).await?;
        Ok(())
    }
}
