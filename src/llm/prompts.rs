pub const SUMMARY_SYSTEM_PROMPT: &str =
    "你是一个专业的评论总结助手，擅长提炼评论的核心观点。You summarize user comments faithfully and concisely.";

pub const CLASSIFY_SYSTEM_PROMPT: &str =
    "你是一个专业的评论分类助手，擅长根据评论内容判断情感倾向。You classify the sentiment of user comments.";

const MAX_COMMENT_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Summarize { max_length: usize },
    Classify,
}

#[derive(Debug, Clone)]
pub struct BatchPrompt<'a> {
    kind: PromptKind,
    comments: &'a [String],
}

impl<'a> BatchPrompt<'a> {
    pub fn summarize(comments: &'a [String], max_length: usize) -> Self {
        Self {
            kind: PromptKind::Summarize { max_length },
            comments,
        }
    }

    pub fn classify(comments: &'a [String]) -> Self {
        Self {
            kind: PromptKind::Classify,
            comments,
        }
    }

    pub fn to_prompt(&self) -> String {
        let mut prompt = match self.kind {
            PromptKind::Summarize { max_length } => format!(
                "请将以下每条评论总结为{}字左右的简洁描述，保持原意。\
                 Answer with a numbered list, one line per comment, in the same order:\n\n",
                max_length
            ),
            PromptKind::Classify => "请将以下每条评论分类为：优（非常正面）、良（比较正面）、中（中性）、差（负面）、不明意义（无法判断）。\
                 Answer with a numbered list containing only the label, one line per comment, in the same order:\n\n"
                .to_string(),
        };

        for (i, comment) in self.comments.iter().enumerate() {
            let mut text: String = comment
                .chars()
                .take(MAX_COMMENT_CHARS)
                .map(|c| if c == '\n' { ' ' } else { c })
                .collect();
            if comment.chars().count() > MAX_COMMENT_CHARS {
                text.push_str("...");
            }
            prompt.push_str(&format!("{}. {}\n", i + 1, text));
        }

        prompt
    }

    pub fn to_request(&self) -> CompletionRequest {
        let (system, temperature, max_tokens) = match self.kind {
            PromptKind::Summarize { .. } => (SUMMARY_SYSTEM_PROMPT, 0.3, 1000),
            PromptKind::Classify => (CLASSIFY_SYSTEM_PROMPT, 0.1, 500),
        };
        CompletionRequest {
            system: system.to_string(),
            prompt: self.to_prompt(),
            temperature,
            max_tokens,
        }
    }
}
