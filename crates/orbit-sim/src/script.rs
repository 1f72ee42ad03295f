use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Scroll(f64),
    Click(usize),
    Select { index: usize, animate: bool },
    Wait(u64),
    Snapshot,
    Dispose,
}

#[derive(Debug, Error, PartialEq)]
#[error("line {line}: {reason}")]
pub struct ScriptError {
    pub line: usize,
    pub reason: String,
}

pub fn parse(source: &str) -> Result<Vec<Command>, ScriptError> {
    source
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.split('#').next().unwrap_or_default().trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line, text)| {
            parse_line(text).map_err(|reason| ScriptError { line, reason })
        })
        .collect()
}

fn parse_line(text: &str) -> Result<Command, String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    match words.as_slice() {
        ["scroll", delta] => delta
            .parse()
            .map(Command::Scroll)
            .map_err(|_| format!("bad scroll delta '{delta}'")),
        ["click", index] => parse_index(index).map(Command::Click),
        ["select", index] => parse_index(index).map(|index| Command::Select {
            index,
            animate: true,
        }),
        ["select", index, "instant"] => parse_index(index).map(|index| Command::Select {
            index,
            animate: false,
        }),
        ["wait", ms] => ms
            .parse()
            .map(Command::Wait)
            .map_err(|_| format!("bad wait '{ms}'")),
        ["snapshot"] => Ok(Command::Snapshot),
        ["dispose"] => Ok(Command::Dispose),
        _ => Err(format!("unknown command '{text}'")),
    }
}

fn parse_index(word: &str) -> Result<usize, String> {
    word.parse().map_err(|_| format!("bad index '{word}'"))
}
