use async_trait::async_trait;
use chrono::Utc;

use crate::crawler::{CommentSource, FetchedComments};
use crate::error::Result;
use crate::models::{CommentOrigin, CommentRecord};

const TEMPLATES: &[&str] = &[
    "这个视频做得真不错，学到了很多东西！",
    "内容很详细，讲解也很清晰，支持up主！",
    "视频质量很高，期待更多作品",
    "感谢分享，对我很有帮助",
    "内容一般般，希望能改进一下",
    "视频太短了，不过瘾",
    "讲解很专业，受益匪浅",
    "画质清晰，声音清楚，体验很好",
    "选题不错，内容充实",
    "很喜欢这种风格的视频",
    "内容有点无聊，建议增加互动",
    "希望能出更多类似的视频",
    "讲解速度适中，很适合学习",
    "视频制作精良，值得推荐",
    "内容有深度，值得思考",
    "视频很有创意，耳目一新",
    "讲解通俗易懂，适合新手",
    "内容全面，覆盖了所有要点",
    "视频节奏很好，不拖沓",
    "感谢up主的用心制作",
];

pub struct SyntheticSource {
    base_time: i64,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self::with_base_time(Utc::now().timestamp())
    }

    pub fn with_base_time(base_time: i64) -> Self {
        Self { base_time }
    }

    pub fn generate(&self, resource_id: &str, limit: usize) -> Vec<CommentRecord> {
        let seed = resource_id
            .bytes()
            .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));

        (0..limit)
            .map(|i| {
                let template = TEMPLATES[seed.wrapping_add(i.wrapping_mul(7)) % TEMPLATES.len()];
                CommentRecord::raw(
                    format!("synthetic_{}", i),
                    template,
                    format!("用户{}", i),
                    (seed.wrapping_add(i * 13) % 100) as u64,
                    self.base_time - (i as i64) * 3_600,
                )
            })
            .collect()
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommentSource for SyntheticSource {
    async fn fetch_comments(&self, resource_id: &str, limit: usize) -> Result<FetchedComments> {
        tracing::warn!(
            "Generating {} synthetic comment(s) for {}",
            limit,
            resource_id
        );
        Ok(FetchedComments {
            comments: self.generate(resource_id, limit),
            origin: CommentOrigin::Synthetic,
        })
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
