//! Bundled research crew: a researcher and a writer in a two-task
//! sequential pipeline that produces a blog post on recent AI developments.

use std::sync::Arc;

use crate::agent::{Agent, AgentConfig};
use crate::capability::{Capability, CapabilitySet, ScrapeWebsiteCapability, WebSearchCapability};
use crate::config::{CrewSettings, EmbedderConfig, SearchConfig};
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::task::Task;

pub const RESEARCH_DESCRIPTION: &str = "Analyze the latest AI advancements from 2024 through 2025. \
Find major trends, breakthrough technologies, and their real-world impacts. \
Focus on the most recent developments and provide a comprehensive report with specific examples and data.";

pub const RESEARCH_EXPECTED_OUTPUT: &str = "A comprehensive report containing:
- Top 5 AI trends from 2024-2025
- Latest breakthrough technologies with real examples
- Market impact analysis and industry adoption
- Current state of AI in October 2025
- Future predictions for 2026 and beyond
Format as structured markdown with clear sections and recent data.";

pub const BLOG_DESCRIPTION: &str = "Create an engaging blog post about the latest AI advancements from 2024-2025 using your research insights. \
Make it current, interesting, and suited for tech enthusiasts and industry professionals. \
It should be comprehensive with engaging headlines and reflect the cutting-edge state of AI as of October 2025.";

pub const BLOG_EXPECTED_OUTPUT: &str = "A well-structured blog post containing:
- Compelling title reflecting 2024-2025 AI developments
- Engaging introduction highlighting recent breakthroughs
- 4+ detailed paragraphs covering latest AI advancements
- Real-world examples and current industry applications
- Analysis of AI's impact through October 2025
- Forward-looking conclusion with 2026+ predictions
- SEO-friendly formatting with compelling subheadings";

/// Senior research analyst with search and scrape capabilities.
pub fn researcher(capabilities: &[Arc<dyn Capability>]) -> Result<Agent> {
    let config = capabilities.iter().fold(
        AgentConfig::new(
            "Senior Research Analyst",
            "Uncover cutting-edge developments in AI and data science",
            "You are an expert at a technology research group,
             skilled in identifying trends and analyzing complex data.",
        ),
        |config, capability| config.with_capability(Arc::clone(capability)),
    );
    Agent::new(
        config
            .allow_delegation(false)
            .with_max_iterations(5)
            .with_memory(true)
            .verbose(true),
    )
}

/// Content strategist that turns research into a blog post.
pub fn writer() -> Result<Agent> {
    Agent::new(
        AgentConfig::new(
            "Tech Content Strategist",
            "Craft compelling content on tech advancements",
            "You are a content strategist known for
             making complex tech topics interesting and easy to understand.",
        )
        .allow_delegation(true)
        .with_max_iterations(3)
        .with_memory(true)
        .verbose(true),
    )
}

/// Default capabilities for the researcher: web search, then page scraping.
pub fn research_capabilities(search: &SearchConfig) -> Result<CapabilitySet> {
    let mut capabilities = CapabilitySet::new();
    capabilities.register(Arc::new(WebSearchCapability::new(search.clone())))?;
    capabilities.register(Arc::new(ScrapeWebsiteCapability::new()))?;
    Ok(capabilities)
}

/// Crew-wide memory with OpenAI embeddings, verbose.
pub fn research_settings() -> CrewSettings {
    CrewSettings::default()
        .with_memory(true)
        .verbose(true)
        .with_embedder(EmbedderConfig::default())
}

/// Assemble the research crew with explicit capabilities.
pub fn research_crew_with(capabilities: &[Arc<dyn Capability>]) -> Result<Pipeline> {
    let researcher = Arc::new(researcher(capabilities)?);
    let writer = Arc::new(writer()?);

    let tasks = vec![
        Task::for_agent(&researcher, RESEARCH_DESCRIPTION, RESEARCH_EXPECTED_OUTPUT),
        Task::for_agent(&writer, BLOG_DESCRIPTION, BLOG_EXPECTED_OUTPUT),
    ];
    Ok(Pipeline::sequential(vec![researcher, writer], tasks)?.with_settings(research_settings()))
}

/// Assemble the research crew with the default search/scrape capabilities.
pub fn research_crew(search: &SearchConfig) -> Result<Pipeline> {
    research_crew_with(research_capabilities(search)?.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_research_crew_shape() {
        let pipeline = research_crew(&SearchConfig::default()).unwrap();
        assert_eq!(pipeline.agents().len(), 2);
        assert_eq!(pipeline.tasks().len(), 2);

        let researcher = &pipeline.agents()[0];
        assert_eq!(researcher.role(), "Senior Research Analyst");
        assert_eq!(researcher.max_iterations(), 5);
        assert!(!researcher.allows_delegation());
        let names: Vec<&str> = researcher.capabilities().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["web_search", "scrape_website"]);

        let writer = &pipeline.agents()[1];
        assert_eq!(writer.role(), "Tech Content Strategist");
        assert_eq!(writer.max_iterations(), 3);
        assert!(writer.allows_delegation());
        assert!(writer.capabilities().is_empty());

        let settings = pipeline.settings();
        assert!(settings.memory);
        assert!(settings.verbose);
        assert_eq!(
            settings.embedder.as_ref().map(|e| e.model.as_str()),
            Some("text-embedding-3-small")
        );
    }

    #[test]
    fn test_tasks_bound_in_order() {
        let pipeline = research_crew(&SearchConfig::default()).unwrap();
        let tasks = pipeline.tasks();
        assert!(Arc::ptr_eq(
            tasks[0].agent().unwrap(),
            &pipeline.agents()[0]
        ));
        assert!(Arc::ptr_eq(
            tasks[1].agent().unwrap(),
            &pipeline.agents()[1]
        ));
        assert!(tasks[1].expected_output().starts_with("A well-structured blog post"));
    }

    #[test]
    fn test_backstory_is_normalized() {
        let agent = writer().unwrap();
        assert_eq!(
            agent.backstory(),
            "You are a content strategist known for making complex tech topics interesting and easy to understand."
        );
    }
}
