use redis::ConnectionLike;
use serde::{Deserialize, Serialize};

use crate::{model::user::User, settings::Config};

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: String,
    pub user_name: String,
}

pub fn add_session<C: ConnectionLike>(
    redis_conn: &mut C,
    user: &User,
    config: &Config,
    token: String,
) -> anyhow::Result<()> {
    let session_data = SessionData {
        user_id: user.id.to_string(),
        user_name: user.user_name.clone(),
    };
    let session_json = serde_json::to_string(&session_data)?;
    // jwt_exp is in minutes
    redis::Cmd::set_ex(token, session_json, config.jwt_exp as u64 * 60).exec(redis_conn)?;
    Ok(())
}

pub fn get_session<C: ConnectionLike>(
    redis_conn: &mut C,
    token: String,
) -> anyhow::Result<Option<SessionData>> {
    let res: Option<String> = redis::cmd("get").arg(token).query(redis_conn)?;
    let Some(res) = res else {
        return Ok(None);
    };
    let session_data: SessionData = serde_json::from_str(res.as_str())?;
    Ok(Some(session_data))
}

/// Returns false when no session was stored under `token`.
pub fn remove_session<C: ConnectionLike>(
    redis_conn: &mut C,
    token: String,
) -> anyhow::Result<bool> {
    let removed: i64 = redis::cmd("del").arg(token).query(redis_conn)?;
    Ok(removed > 0)
}
