//! Task - 单个目标上执行的一次工作单元
//!
//! 每种操作类型对应一个强类型参数结构，取代字符串分发。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 工作单元
///
/// 入队后不可变，出队后恰好执行一次，失败时不会自动重新入队。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Task {
    /// 自然语言描述的 UI 动作 (点击、输入等)
    ExecuteAction(ExecuteActionParams),

    /// 视觉检查：目标画面是否符合描述
    See(SeeParams),

    /// 按键 (可带修饰键)
    PressKey(PressKeyParams),

    /// 滚动
    Scroll(ScrollParams),
}

/// `execute_action` 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteActionParams {
    /// 动作描述, e.g. "Type https://www.google.com into the url bar"
    pub query: String,

    /// 元素检测置信度阈值 [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements_conf: Option<f32>,

    /// 行检测置信度阈值 [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_conf: Option<f32>,
}

/// `see` 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeeParams {
    /// 期望看到的画面描述
    pub description: String,

    /// 是否等待画面出现
    #[serde(default)]
    pub wait: bool,

    /// 等待超时 (秒)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,
}

/// `press_key` 参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressKeyParams {
    /// 按键名, e.g. "enter", "n"
    pub key: String,

    /// 修饰键, e.g. ["command"]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
}

/// `scroll` 参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollParams {
    pub direction: ScrollDirection,

    /// 滚动步数，必须 > 0
    #[serde(default = "default_scroll_amount")]
    pub amount: u32,
}

fn default_scroll_amount() -> u32 {
    1
}

/// 滚动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
}

/// 任务类型标签 (用于日志与指标)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    ExecuteAction,
    See,
    PressKey,
    Scroll,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExecuteAction => "execute_action",
            Self::See => "see",
            Self::PressKey => "press_key",
            Self::Scroll => "scroll",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Task {
    /// 构造 `execute_action`
    pub fn execute_action(query: impl Into<String>) -> Self {
        Self::ExecuteAction(ExecuteActionParams {
            query: query.into(),
            elements_conf: None,
            rows_conf: None,
        })
    }

    /// 构造 `see`
    pub fn see(description: impl Into<String>) -> Self {
        Self::See(SeeParams {
            description: description.into(),
            wait: false,
            timeout_secs: None,
        })
    }

    /// 构造 `press_key`
    pub fn press_key(key: impl Into<String>) -> Self {
        Self::PressKey(PressKeyParams {
            key: key.into(),
            modifiers: Vec::new(),
        })
    }

    /// 构造带修饰键的 `press_key`
    pub fn key_combo<I, S>(key: impl Into<String>, modifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::PressKey(PressKeyParams {
            key: key.into(),
            modifiers: modifiers.into_iter().map(Into::into).collect(),
        })
    }

    /// 构造 `scroll`
    pub fn scroll(direction: ScrollDirection, amount: u32) -> Self {
        Self::Scroll(ScrollParams { direction, amount })
    }

    /// 任务类型标签
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::ExecuteAction(_) => TaskKind::ExecuteAction,
            Self::See(_) => TaskKind::See,
            Self::PressKey(_) => TaskKind::PressKey,
            Self::Scroll(_) => TaskKind::Scroll,
        }
    }

    /// 单行摘要 (日志/报告用)
    pub fn describe(&self) -> String {
        match self {
            Self::ExecuteAction(p) => format!("execute_action: {}", p.query),
            Self::See(p) => format!("see: {}", p.description),
            Self::PressKey(p) if p.modifiers.is_empty() => format!("press_key: {}", p.key),
            Self::PressKey(p) => format!("press_key: {}+{}", p.modifiers.join("+"), p.key),
            Self::Scroll(p) => format!("scroll: {:?} x{}", p.direction, p.amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_kind_tags() {
        assert_eq!(Task::execute_action("click").kind(), TaskKind::ExecuteAction);
        assert_eq!(Task::see("a page").kind(), TaskKind::See);
        assert_eq!(Task::press_key("enter").kind(), TaskKind::PressKey);
        assert_eq!(
            Task::scroll(ScrollDirection::Down, 1).kind(),
            TaskKind::Scroll
        );
    }

    #[test]
    fn test_task_serde_tag() {
        let task = Task::key_combo("n", ["command"]);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["kind"], "press_key");
        assert_eq!(json["key"], "n");
        assert_eq!(json["modifiers"][0], "command");
    }

    #[test]
    fn test_task_from_toml_defaults() {
        let task: Task = toml::from_str(
            r#"
kind = "scroll"
direction = "down"
"#,
        )
        .unwrap();
        assert_eq!(task, Task::scroll(ScrollDirection::Down, 1));

        let task: Task = toml::from_str(
            r#"
kind = "see"
description = "A webpage from github.com"
wait = true
timeout_secs = 10.0
"#,
        )
        .unwrap();
        match task {
            Task::See(p) => {
                assert!(p.wait);
                assert_eq!(p.timeout_secs, Some(10.0));
            }
            other => panic!("unexpected task: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result: Result<Task, _> = serde_json::from_str(r#"{"kind":"drag","x":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            Task::key_combo("n", ["command"]).describe(),
            "press_key: command+n"
        );
        assert_eq!(Task::press_key("enter").describe(), "press_key: enter");
    }
}
