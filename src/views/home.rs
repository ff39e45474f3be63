use super::{report, AppContext};
use crate::error::{AppError, Result};
use crate::repositories::{DeviceRepository, UserRepository};

/// Account summary: who is signed in, how many appliances, the bill.
pub struct HomeScreen {
    ctx: AppContext,
    pub user_name: String,
    pub user_email: String,
    pub total_appliances: usize,
    pub total_bill_amount: f64,
    pub error_message: Option<String>,
}

impl HomeScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            user_name: String::new(),
            user_email: String::new(),
            total_appliances: 0,
            total_bill_amount: 0.0,
            error_message: None,
        }
    }

    pub async fn load(&mut self) -> Result<()> {
        let Some(uid) = self.ctx.require_uid("home load") else {
            return Ok(());
        };

        let fetched = async {
            let profile = UserRepository::get_profile(self.ctx.store(), &uid).await?;
            let count = DeviceRepository::count_devices(self.ctx.store(), &uid).await?;
            Ok::<_, AppError>((profile, count))
        }
        .await;

        match fetched {
            Ok((Some(profile), count)) => {
                self.user_name = profile.name;
                self.user_email = profile.email;
                self.total_bill_amount = profile.total_bill_amount.unwrap_or(0.0);
                self.total_appliances = count;
                Ok(())
            }
            Ok((None, count)) => {
                self.total_appliances = count;
                Ok(())
            }
            Err(e) => {
                report(&mut self.error_message, "Error fetching user data", &e);
                Err(e)
            }
        }
    }

    pub async fn update_name(&mut self, name: &str) -> Result<()> {
        let Some(uid) = self.ctx.require_uid("name update") else {
            return Ok(());
        };
        match UserRepository::update_name(self.ctx.store(), &uid, name).await {
            Ok(()) => {
                self.user_name = name.to_string();
                Ok(())
            }
            Err(e) => {
                report(&mut self.error_message, "Error updating name", &e);
                Err(e)
            }
        }
    }
}
