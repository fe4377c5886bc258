//! 配置校验模块
//!
//! 校验规则：
//! - target name 非空且唯一
//! - app 非空
//! - scheduling_quantum_ms > 0
//! - poll_interval_ms > 0, timeout_secs > 0, 且轮询间隔不超过超时
//! - 任务参数合法 (描述非空、置信度在 [0, 1]、滚动步数 > 0)

use std::collections::HashSet;

use contracts::{ContractError, FleetBlueprint, Task, TargetConfig};

/// 校验 FleetBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &FleetBlueprint) -> Result<(), ContractError> {
    validate_target_names(blueprint)?;
    validate_target_apps(blueprint)?;
    validate_dispatcher(blueprint)?;
    validate_wait(blueprint)?;
    validate_tasks(blueprint)?;
    Ok(())
}

/// 校验 target name 非空且唯一
fn validate_target_names(blueprint: &FleetBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, target) in blueprint.targets.iter().enumerate() {
        if target.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("targets[{idx}].name"),
                "target name cannot be empty",
            ));
        }
        if !seen.insert(target.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("targets[name={}]", target.name),
                "duplicate target name",
            ));
        }
    }
    Ok(())
}

fn validate_target_apps(blueprint: &FleetBlueprint) -> Result<(), ContractError> {
    for target in &blueprint.targets {
        if target.app.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("targets[{}].app", target.name),
                "app cannot be empty",
            ));
        }
    }
    Ok(())
}

fn validate_dispatcher(blueprint: &FleetBlueprint) -> Result<(), ContractError> {
    if blueprint.dispatcher.scheduling_quantum_ms == 0 {
        return Err(ContractError::config_validation(
            "dispatcher.scheduling_quantum_ms",
            "scheduling_quantum_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验等待配置
fn validate_wait(blueprint: &FleetBlueprint) -> Result<(), ContractError> {
    let wait = &blueprint.wait;

    if wait.poll_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "wait.poll_interval_ms",
            "poll_interval_ms must be > 0",
        ));
    }
    if wait.timeout_secs == 0 {
        return Err(ContractError::config_validation(
            "wait.timeout_secs",
            "timeout_secs must be > 0",
        ));
    }
    if wait.poll_interval_ms > wait.timeout_secs.saturating_mul(1000) {
        return Err(ContractError::config_validation(
            "wait.poll_interval_ms / wait.timeout_secs",
            format!(
                "poll_interval_ms ({}) must be <= timeout ({} s)",
                wait.poll_interval_ms, wait.timeout_secs
            ),
        ));
    }
    Ok(())
}

/// 校验每个目标的初始任务
fn validate_tasks(blueprint: &FleetBlueprint) -> Result<(), ContractError> {
    for target in &blueprint.targets {
        for (idx, task) in target.tasks.iter().enumerate() {
            validate_task(target, idx, task)?;
        }
    }
    Ok(())
}

fn validate_task(target: &TargetConfig, idx: usize, task: &Task) -> Result<(), ContractError> {
    let field = |name: &str| format!("targets[{}].tasks[{idx}].{name}", target.name);

    match task {
        Task::ExecuteAction(params) => {
            if params.query.trim().is_empty() {
                return Err(ContractError::config_validation(
                    field("query"),
                    "query cannot be empty",
                ));
            }
            for (name, conf) in [
                ("elements_conf", params.elements_conf),
                ("rows_conf", params.rows_conf),
            ] {
                if let Some(conf) = conf {
                    if !(0.0..=1.0).contains(&conf) {
                        return Err(ContractError::config_validation(
                            field(name),
                            format!("{name} must be in [0, 1], got {conf}"),
                        ));
                    }
                }
            }
        }
        Task::See(params) => {
            if params.description.trim().is_empty() {
                return Err(ContractError::config_validation(
                    field("description"),
                    "description cannot be empty",
                ));
            }
            if let Some(timeout) = params.timeout_secs {
                if !(timeout > 0.0) {
                    return Err(ContractError::config_validation(
                        field("timeout_secs"),
                        format!("timeout_secs must be > 0, got {timeout}"),
                    ));
                }
            }
        }
        Task::PressKey(params) => {
            if params.key.trim().is_empty() {
                return Err(ContractError::config_validation(
                    field("key"),
                    "key cannot be empty",
                ));
            }
        }
        Task::Scroll(params) => {
            if params.amount == 0 {
                return Err(ContractError::config_validation(
                    field("amount"),
                    "amount must be > 0",
                ));
            }
        }
    }
    Ok(())
}
