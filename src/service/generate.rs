use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    repo::posts::NewPost,
    util::{
        gemini::{strip_code_fences, TextGenerator},
        keywords::{DuplicateDetector, KeywordExtractor, KeywordSet},
    },
};

const NO_HISTORY: &str = "None yet";

#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Titles of the most recent posts, newest first.
    async fn recent_titles(&self, limit: i64) -> Result<Vec<String>>;

    /// Persist a post and return its public identifier.
    async fn insert_post(&self, post: &NewPost) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Inserted {
        uuid: String,
        title: String,
        category: String,
    },
    SkippedDuplicate {
        title: String,
        matched: String,
    },
}

#[derive(Debug, Deserialize)]
struct GeneratedArticle {
    title: String,
    content: String,
}

pub struct PostGenerator<'a> {
    pub categories: &'a [String],
    pub recent_limit: i64,
    pub extractor: &'a KeywordExtractor,
    pub detector: &'a DuplicateDetector,
}

impl PostGenerator<'_> {
    pub async fn run<G, S>(&self, generator: &G, store: &S) -> Result<GenerationOutcome>
    where
        G: TextGenerator + ?Sized,
        S: GenerationStore + ?Sized,
    {
        let category = self
            .categories
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| anyhow!("no categories configured"))?;
        self.run_for_category(generator, store, &category).await
    }

    pub async fn run_for_category<G, S>(
        &self,
        generator: &G,
        store: &S,
        category: &str,
    ) -> Result<GenerationOutcome>
    where
        G: TextGenerator + ?Sized,
        S: GenerationStore + ?Sized,
    {
        let recent = store
            .recent_titles(self.recent_limit)
            .await
            .context("failed to load recent titles")?;

        info!(category, "brainstorming a unique angle");
        let topic = generator
            .generate(&brainstorm_prompt(category, &recent))
            .await
            .context("brainstorm step failed")?;
        let topic = topic.trim();

        info!(topic, "writing the article");
        let raw = generator
            .generate(&write_prompt(topic))
            .await
            .context("writing step failed")?;
        let article = parse_article(&raw)?;

        let candidate = self.extractor.extract(&article.title);
        let seen: Vec<KeywordSet> = recent
            .iter()
            .map(|title| self.extractor.extract(title))
            .collect();
        if let Some(index) = self.detector.find_duplicate(&candidate, &seen) {
            let matched = recent[index].clone();
            warn!(title = %article.title, matched = %matched, "generated post paraphrases a recent one, skipping");
            return Ok(GenerationOutcome::SkippedDuplicate {
                title: article.title,
                matched,
            });
        }

        let post = NewPost {
            title: article.title,
            content: article.content,
            category: category.to_string(),
        };
        let uuid = store
            .insert_post(&post)
            .await
            .context("failed to save generated post")?;

        info!(title = %post.title, %uuid, "new unique post added");
        Ok(GenerationOutcome::Inserted {
            uuid,
            title: post.title,
            category: post.category,
        })
    }
}

fn brainstorm_prompt(category: &str, recent: &[String]) -> String {
    let past_titles = if recent.is_empty() {
        NO_HISTORY.to_string()
    } else {
        recent.join(", ")
    };

    format!(
        "You are an expert editorial director. We are writing a blog about {category}.\n\
         Here are the titles of the posts we have already published: [{past_titles}].\n\n\
         Your task: Invent a very specific, unique, and insightful \"niche topic\" within {category} \
         that is DIFFERENT from the ones above.\n\
         Avoid generic \"Future of...\" or \"Basics of...\" topics. Find a \"weird\" angle, a forgotten \
         history, or a counter-intuitive theory.\n\n\
         Return ONLY a single sentence that will be the specific topic/prompt for the next writer."
    )
}

fn write_prompt(topic: &str) -> String {
    format!(
        "You are a world-class essayist. Write a deeply insightful blog post about this specific topic: \"{topic}\".\n\n\
         Requirements:\n\
         - Use a \"Cottagecore/Rainy Day\" intellectual tone (thoughtful, cozy, but brilliant).\n\
         - Do not use cliches.\n\
         - Format the output strictly as a JSON object: {{\"title\": \"...\", \"content\": \"...\"}}\n\
         FORMATTING INSTRUCTIONS:\n\
         - Use Markdown for the content.\n\
         - IMPORTANT: You MUST use exactly two newline characters (\\n\\n) between every paragraph to ensure clear spacing.\n\
         - Use ## for subheadings if the post is long.\n\
         - Ensure the title is poetic and catchy."
    )
}

fn parse_article(raw: &str) -> Result<GeneratedArticle> {
    let cleaned = strip_code_fences(raw);
    let article: GeneratedArticle = serde_json::from_str(&cleaned)
        .with_context(|| format!("generated article is not valid JSON: {cleaned}"))?;

    let title = article.title.trim().to_string();
    if title.is_empty() {
        return Err(anyhow!("generated article has an empty title"));
    }
    if article.content.trim().is_empty() {
        return Err(anyhow!("generated article has empty content"));
    }

    Ok(GeneratedArticle {
        title,
        content: article.content,
    })
}
