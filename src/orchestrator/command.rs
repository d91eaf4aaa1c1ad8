//! 输入命令解析
//!
//! 一行输入对应一个用户操作，数字参数从 1 开始

use std::str::FromStr;
use thiserror::Error;

use crate::models::catalog::ConfigField;

/// 用户操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// 修改配置项，下标从 0 开始
    Select(ConfigField, usize),
    Start,
    Accept,
    Next,
    Previous,
    /// 跳到第 n 题（从 1 开始）
    GoTo(usize),
    Answer(String),
    Clear,
    Submit,
    Yes,
    No,
    Restart,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Please type a command (try `help`)")]
    Empty,

    #[error("Unknown command `{0}` (try `help`)")]
    Unknown(String),

    #[error("`{command}` needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("`{value}` is not a valid number for `{command}`")]
    InvalidNumber { command: &'static str, value: String },
}

pub const HELP_TEXT: &str = "\
Commands
  Configuration:  class <n> | subject <n> | type <n> | duration <n> | marks <n>
                  start             show the guidelines and begin
                  accept | no       accept or go back from the guidelines
  Exam:           answer <text>     answer the current question (option letter for MCQs)
                  clear             erase the current answer
                  next | prev | goto <n>
                  submit            submit the exam (asks for confirmation)
                  yes | no          confirm or cancel a submission
  Anywhere:       restart | help | quit";

fn number(command: &'static str, arg: Option<&str>) -> Result<usize, ParseError> {
    let value = arg.ok_or(ParseError::MissingArgument {
        command,
        expected: "a number",
    })?;
    match usize::from_str(value) {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::InvalidNumber {
            command,
            value: value.to_string(),
        }),
    }
}

/// 解析一行输入
pub fn parse_action(line: &str) -> Result<UserAction, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, Some(rest.trim()).filter(|r| !r.is_empty())),
        None => (line, None),
    };

    let select = |field: ConfigField, name: &'static str| -> Result<UserAction, ParseError> {
        Ok(UserAction::Select(field, number(name, rest)? - 1))
    };

    match command.to_ascii_lowercase().as_str() {
        "class" => select(ConfigField::ClassLevel, "class"),
        "subject" => select(ConfigField::Subject, "subject"),
        "type" => select(ConfigField::ExamType, "type"),
        "duration" => select(ConfigField::Duration, "duration"),
        "marks" => select(ConfigField::TotalMarks, "marks"),
        "start" => Ok(UserAction::Start),
        "accept" => Ok(UserAction::Accept),
        "next" | "n" => Ok(UserAction::Next),
        "prev" | "p" => Ok(UserAction::Previous),
        "goto" => Ok(UserAction::GoTo(number("goto", rest)?)),
        "answer" | "a" => rest
            .map(|text| UserAction::Answer(text.to_string()))
            .ok_or(ParseError::MissingArgument {
                command: "answer",
                expected: "some text",
            }),
        "clear" => Ok(UserAction::Clear),
        "submit" => Ok(UserAction::Submit),
        "yes" | "y" => Ok(UserAction::Yes),
        "no" => Ok(UserAction::No),
        "restart" => Ok(UserAction::Restart),
        "help" | "?" => Ok(UserAction::Help),
        "quit" | "exit" => Ok(UserAction::Quit),
        _ => Err(ParseError::Unknown(command.to_string())),
    }
}
