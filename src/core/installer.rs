use crate::core::{ConfigWizardItems, InstallReport, ModuleRepository, ModuleState, Result};

pub const DEFAULT_MODULES: &str =
    "company party product product_price_list account account_payment_type sale purchase";

/// 模組清單以空白分隔；空字串得到空清單
pub fn parse_module_list(modules: &str) -> Vec<String> {
    modules.split_whitespace().map(str::to_string).collect()
}

/// Installs or upgrades `requested` and reports which modules transitioned.
///
/// `to_install` is captured right before the install/upgrade wizard runs and
/// only lists requested modules; modules that were already installed show up
/// in `installed` but never in `to_install`.
pub async fn install_modules(
    modules: &dyn ModuleRepository,
    wizard_items: &dyn ConfigWizardItems,
    requested: &[String],
) -> Result<InstallReport> {
    if requested.is_empty() {
        tracing::info!("⏭️ No modules requested, nothing to install");
        let installed = names(modules.find_by_state(ModuleState::Installed).await?);
        return Ok(InstallReport {
            installed,
            ..InstallReport::default()
        });
    }

    let found = modules.find_by_names(requested).await?;
    let missing: Vec<&String> = requested
        .iter()
        .filter(|name| !found.iter().any(|m| &m.name == *name))
        .collect();
    if !missing.is_empty() {
        tracing::warn!("⚠️ Unknown modules ignored: {:?}", missing);
    }

    let (upgrade, install): (Vec<_>, Vec<_>) = found
        .iter()
        .partition(|m| m.state == ModuleState::Installed);

    if !upgrade.is_empty() {
        let ids: Vec<i64> = upgrade.iter().map(|m| m.id).collect();
        tracing::debug!("🔄 Upgrade requested for {} modules", ids.len());
        modules.request_upgrade(&ids).await?;
    }
    if !install.is_empty() {
        let ids: Vec<i64> = install.iter().map(|m| m.id).collect();
        tracing::debug!("📦 Install requested for {} modules", ids.len());
        modules.request_install(&ids).await?;
    }

    let pending = names(modules.find_by_state(ModuleState::ToInstall).await?);
    let (to_install, dependencies): (Vec<String>, Vec<String>) =
        pending.into_iter().partition(|name| requested.contains(name));
    if !dependencies.is_empty() {
        tracing::info!("🔗 Dependencies scheduled: {}", dependencies.join(", "));
    }

    modules.apply_pending().await?;

    let open_items: Vec<i64> = wizard_items
        .find_pending()
        .await?
        .into_iter()
        .map(|item| item.id)
        .collect();
    if !open_items.is_empty() {
        tracing::debug!("✔️ Closing {} configuration wizard items", open_items.len());
        wizard_items.mark_done(&open_items).await?;
    }

    let installed = names(modules.find_by_state(ModuleState::Installed).await?);

    tracing::info!(
        "✅ Modules installed this run: {} ({} installed in total)",
        to_install.len(),
        installed.len()
    );

    Ok(InstallReport {
        to_install,
        installed,
        dependencies,
    })
}

fn names(modules: Vec<crate::core::Module>) -> Vec<String> {
    modules.into_iter().map(|m| m.name).collect()
}
