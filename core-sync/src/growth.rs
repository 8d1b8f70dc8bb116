//! Daily sign-in pass.
//!
//! Accounts whose credential carries the mobile-auth parameters can claim
//! a small daily capacity reward. The pass is best-effort: any failure is
//! logged and the sync run proceeds regardless.

use crate::gateway::DriveGateway;
use tracing::{error, info};

/// Render a byte count with a binary-unit suffix.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Perform (or report) today's sign-in for one account.
///
/// Returns a one-line summary for the log, or `None` when the credential
/// cannot sign in or the endpoints failed.
pub async fn daily_sign(gateway: &dyn DriveGateway) -> Option<String> {
    if !gateway.has_mobile_auth() {
        info!("Credential lacks mobile-auth parameters, skipping sign-in");
        return None;
    }

    let growth = match gateway.growth_info().await {
        Ok(g) => g,
        Err(e) => {
            error!(error = %e, "Failed to fetch growth info");
            return None;
        }
    };

    let tier = if growth.vip { "premium" } else { "free" };
    let prefix = format!(
        "{} {} + sign-in reward {}",
        tier,
        format_bytes(growth.total_capacity),
        format_bytes(growth.sign_reward),
    );

    if growth.signed_today {
        return Some(format!(
            "{} | already signed today, +{} ({}/{})",
            prefix,
            format_bytes(growth.daily_reward),
            growth.sign_progress,
            growth.sign_target,
        ));
    }

    match gateway.growth_sign().await {
        Ok(reward) => Some(format!(
            "{} | signed in, +{} ({}/{})",
            prefix,
            format_bytes(reward),
            growth.sign_progress + 1,
            growth.sign_target,
        )),
        Err(e) => {
            error!(error = %e, "Sign-in failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockDriveGateway;
    use crate::types::GrowthInfo;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[tokio::test]
    async fn test_skips_without_mobile_auth() {
        let mut gateway = MockDriveGateway::new();
        gateway.expect_has_mobile_auth().return_const(false);
        assert!(daily_sign(&gateway).await.is_none());
    }

    #[tokio::test]
    async fn test_signs_in_when_not_signed_today() {
        let mut gateway = MockDriveGateway::new();
        gateway.expect_has_mobile_auth().return_const(true);
        gateway.expect_growth_info().returning(|| {
            Ok(GrowthInfo {
                vip: false,
                total_capacity: 10 * 1024 * 1024 * 1024,
                sign_reward: 300 * 1024 * 1024,
                signed_today: false,
                daily_reward: 0,
                sign_progress: 3,
                sign_target: 7,
            })
        });
        gateway
            .expect_growth_sign()
            .times(1)
            .returning(|| Ok(100 * 1024 * 1024));

        let summary = daily_sign(&gateway).await.unwrap();
        assert!(summary.contains("signed in"));
        assert!(summary.contains("100.00 MB"));
        assert!(summary.contains("(4/7)"));
    }

    #[tokio::test]
    async fn test_reports_when_already_signed() {
        let mut gateway = MockDriveGateway::new();
        gateway.expect_has_mobile_auth().return_const(true);
        gateway.expect_growth_info().returning(|| {
            Ok(GrowthInfo {
                signed_today: true,
                daily_reward: 50 * 1024 * 1024,
                sign_progress: 5,
                sign_target: 7,
                ..GrowthInfo::default()
            })
        });
        // growth_sign must not be called

        let summary = daily_sign(&gateway).await.unwrap();
        assert!(summary.contains("already signed"));
        assert!(summary.contains("(5/7)"));
    }
}
