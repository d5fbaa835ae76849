//! Article synthesis from research bundles.
//!
//! An article always has six paragraphs in a fixed order (see [`Slot`]). The
//! first three slots prefer real extracted lines; every slot has a category
//! template to fall back on, so synthesis cannot fail.

use crate::category::{Category, Theme};
use crate::models::{Article, Attribution, ResearchBundle, Topic};
use itertools::Itertools;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use std::collections::HashSet;
use tracing::debug;

/// Paragraph positions, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Lead,
    Background,
    Analysis,
    OfficialResponse,
    BroaderContext,
    ForwardLook,
}

impl Slot {
    pub const ORDER: [Slot; 6] = [
        Slot::Lead,
        Slot::Background,
        Slot::Analysis,
        Slot::OfficialResponse,
        Slot::BroaderContext,
        Slot::ForwardLook,
    ];

    /// (minimum length, cap) for slots that may take an extracted line.
    fn line_bounds(&self) -> Option<(usize, usize)> {
        match self {
            Slot::Lead => Some((100, 400)),
            Slot::Background => Some((80, 350)),
            Slot::Analysis => Some((80, 300)),
            _ => None,
        }
    }

    fn fillers(&self) -> &'static [&'static str] {
        match self {
            Slot::Lead => LEAD_FILLERS,
            Slot::Background => BACKGROUND_FILLERS,
            _ => ANALYSIS_FILLERS,
        }
    }
}

const GENERIC_PHRASES: &[&str] = &[
    "cookie",
    "privacy policy",
    "subscribe",
    "newsletter",
    "advertisement",
    "sign up",
    "log in",
    "menu",
    "navigation",
    "follow us",
    "social media",
];

const FALLBACK_MARKERS: &[&str] = &[
    "according to sources familiar with the matter",
    "emergency services report",
    "sources tell",
    "No meaningful content could be extracted",
    "Breaking News, Latest News and Videos",
    "This is a placeholder summary",
    "This is a fallback summary",
];

const LEAD_FILLERS: &[&str] = &[
    "The situation has been developing rapidly over the past several hours, with new details emerging throughout the day.",
    "Local authorities have confirmed they are treating the matter as a high priority requiring immediate attention.",
    "Preliminary reports suggest the circumstances surrounding the event are complex and still under review.",
];

const BACKGROUND_FILLERS: &[&str] = &[
    "The development comes at a time when public attention has been focused on similar issues across the region.",
    "Experts note that such developments often require careful analysis before their full implications are understood.",
    "Past cases suggest that resolving matters like this typically involves several stakeholders working together.",
];

const ANALYSIS_FILLERS: &[&str] = &[
    "Witness accounts and official reports are being reviewed to establish an accurate timeline of events.",
    "The complexity of the situation has required coordination between several agencies and departments.",
    "Specialists have been brought in to make sure all relevant evidence is properly examined.",
];

const FALLBACK_ATTRIBUTIONS: &[(&str, &str)] = &[
    ("BBC News", "https://bbc.com/news"),
    ("Reuters", "https://reuters.com"),
    ("Associated Press", "https://apnews.com"),
];

/// True when a line carries text produced by a fallback path.
pub fn is_fallback_text(line: &str) -> bool {
    FALLBACK_MARKERS.iter().any(|m| line.contains(m))
}

fn is_generic(line: &str) -> bool {
    let lower = line.to_lowercase();
    GENERIC_PHRASES.iter().any(|p| lower.contains(p))
}

/// Cut to `cap` characters, marking the cut with `"..."`.
fn cap_line(line: &str, cap: usize) -> String {
    if line.chars().count() > cap {
        let head: String = line.chars().take(cap).collect();
        format!("{head}...")
    } else {
        line.to_string()
    }
}

/// Builds six-paragraph articles. Owns its RNG so output is reproducible
/// for a given seed.
pub struct ContentSynthesizer {
    rng: StdRng,
}

impl ContentSynthesizer {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn synthesize(&mut self, bundle: &ResearchBundle) -> Article {
        let topic = &bundle.topic;
        let category = Category::classify(&topic.title);

        // Lines from real pages only, in search rank.
        let candidates: Vec<&str> = bundle
            .ranked()
            .filter(|e| e.is_extracted())
            .flat_map(|e| e.lines.iter().map(String::as_str))
            .filter(|l| !is_generic(l) && !is_fallback_text(l))
            .collect();
        let mut used: HashSet<&str> = HashSet::new();

        let paragraphs = Slot::ORDER.map(|slot| {
            let sourced = slot.line_bounds().and_then(|(min, cap)| {
                let line = candidates
                    .iter()
                    .copied()
                    .filter(|l| l.chars().count() > min && !used.contains(l))
                    .max_by_key(|l| l.chars().count())?;
                used.insert(line);
                Some(self.expand(&cap_line(line, cap), slot))
            });
            match sourced {
                Some(paragraph) => {
                    debug!(slot = ?slot, "Filled slot from extracted content");
                    paragraph
                }
                None => template(slot, topic, category, bundle.extracts.len()),
            }
        });

        Article {
            topic: topic.clone(),
            paragraphs,
            attributions: attributions(bundle),
        }
    }

    /// Append two filler sentences picked from the slot's bank.
    fn expand(&mut self, base: &str, slot: Slot) -> String {
        let bank = slot.fillers();
        let picks = index::sample(&mut self.rng, bank.len(), 2.min(bank.len()));
        let mut out = base.to_string();
        for i in picks.iter() {
            out.push(' ');
            out.push_str(bank[i]);
        }
        out
    }
}

/// One attribution per extracted domain, or the fixed trio when none.
pub fn attributions(bundle: &ResearchBundle) -> Vec<Attribution> {
    let found: Vec<Attribution> = bundle
        .ranked()
        .filter(|e| e.is_extracted())
        .unique_by(|e| e.domain.clone())
        .map(|e| Attribution {
            domain: e.domain.clone(),
            url: e.url.clone(),
        })
        .collect();
    if !found.is_empty() {
        return found;
    }
    FALLBACK_ATTRIBUTIONS
        .iter()
        .map(|(domain, url)| Attribution {
            domain: domain.to_string(),
            url: url.to_string(),
        })
        .collect()
}

fn template(slot: Slot, topic: &Topic, category: Category, sources: usize) -> String {
    let subject = topic.title.to_lowercase();
    match slot {
        Slot::Lead => lead_template(category, &subject),
        Slot::Background => background_template(sources),
        Slot::Analysis => analysis_template(category),
        Slot::OfficialResponse => official_template(category),
        Slot::BroaderContext => context_template(Theme::classify(&topic.title)),
        Slot::ForwardLook => outlook_template(category),
    }
}

fn lead_template(category: Category, subject: &str) -> String {
    match category {
        Category::Enforcement => format!(
            "Law enforcement officials are looking into {subject}, with several departments now coordinating their work. \
             Senior investigators have been assigned to oversee the inquiry, which is moving quickly given the level of public interest. \
             Officials say all available resources are being committed to a thorough examination of the facts. \
             The case has been classed as a priority, and regular briefings are planned to keep the public informed."
        ),
        Category::Casualty => format!(
            "Multiple fatalities have been reported in an incident involving {subject}. \
             Emergency crews reached the scene within minutes of the first calls and began rescue operations. \
             Medical teams treated the injured while police set up a perimeter to preserve evidence. \
             The incident has already prompted a review of local safety measures and response procedures."
        ),
        Category::Government => format!(
            "Senior government officials are addressing {subject}, in what is being described as a significant policy moment. \
             The announcement follows weeks of discussion and marks a clear shift in the official position. \
             Cabinet members have been briefed on the implications, and consultations between departments are continuing. \
             Officials have stressed their commitment to openness as the measures are put in place."
        ),
        Category::Judicial => format!(
            "Legal proceedings are underway regarding {subject}. \
             The case has drawn the attention of legal experts, who say it could set precedents for similar disputes. \
             Both sides have spent recent weeks preparing, with a number of pre-trial motions already filed. \
             The presiding judge has emphasised the need for a fair hearing conducted strictly by the book."
        ),
        Category::Default => format!(
            "Authorities are responding to developments involving {subject}. \
             The situation has prompted action from the relevant agencies and continues to change as new information comes in. \
             Several departments are coordinating their response to make sure the necessary measures are carried out. \
             The public is being kept informed through regular updates as events unfold."
        ),
    }
}

fn background_template(sources: usize) -> String {
    let opening = "The story has raised questions about wider systemic issues and existing safeguards.";
    if sources > 0 {
        format!(
            "{opening} Reports from {sources} different news sources have offered varying perspectives on the situation, \
             underlining how complex the issues are. Journalists and analysts are piecing together a fuller picture from witness accounts and official statements. \
             Coverage so far has shed light on the circumstances leading up to the events as well as the immediate official response."
        )
    } else {
        format!(
            "{opening} Officials are reviewing current procedures to find any gaps that could allow a repeat. \
             A wider assessment of the relevant policies is under way, with input from subject matter experts. \
             Recommendations for updated guidelines are expected once the review concludes."
        )
    }
}

fn analysis_template(category: Category) -> String {
    match category {
        Category::Enforcement => "The investigation involves several departments gathering evidence and interviewing key witnesses under the direction of senior officers. \
             Forensic teams have been deployed to examine the available material. \
             Detectives are following up on tips from the public through a dedicated line. \
             Additional resources have been allocated given the level of interest in the case.",
        Category::Casualty => "Paramedics began triage within minutes of the first reports and treated the injured at the scene. \
             Police secured the area and started collecting evidence while the response continued. \
             Medical examiners are working with investigators to establish the exact circumstances. \
             The response has renewed attention on coordination between emergency agencies.",
        Category::Government => "The measures follow months of consultation with stakeholders and expert review. \
             Officials are working across departments on an implementation plan with clear timelines. \
             Impact assessments suggest the changes will reach several sectors of the economy. \
             Implementation is expected to be phased so adjustments can be made based on early results.",
        Category::Judicial | Category::Default => "Experts are weighing the implications of these developments as more details emerge. \
             Specialists are discussing best practices and the lessons of comparable cases. \
             Stakeholders are watching closely to gauge the likely effect on their work and communities. \
             Outside consultants have been brought in to make sure every relevant factor is considered.",
    }
    .to_string()
}

fn official_template(category: Category) -> String {
    match category {
        Category::Enforcement => "Police officials have issued a statement promising a thorough and transparent investigation. \
             A spokesperson said specialised units are involved and outside expertise will be used where needed. \
             A hotline has been set up for anyone with relevant information. \
             Senior officers are briefing oversight bodies regularly as the inquiry proceeds.",
        Category::Government => "Government representatives have addressed the matter in statements to the press, setting out their planned response and timeline. \
             Officials said they are committed to addressing public concerns and to taking appropriate action. \
             A senior spokesperson indicated that further announcements will follow as the situation develops. \
             Cabinet ministers have expressed their support for the proposed course of action.",
        Category::Judicial => "Legal teams on both sides have prepared extensive documentation for the proceedings. \
             Court officials have confirmed that proper procedure is being followed to guarantee a fair hearing. \
             The judge has asked that the process be allowed to run without outside interference and has issued guidance for media coverage. \
             Security at the courthouse has been increased for the duration of the case.",
        Category::Casualty | Category::Default => "Officials have convened meetings to coordinate the response, bringing together representatives from the agencies involved. \
             Clear communication channels have been set up so that the necessary measures are carried out effectively. \
             Designated spokespeople are handling media inquiries and providing regular updates. \
             Established response protocols have been activated where appropriate.",
    }
    .to_string()
}

fn context_template(theme: Theme) -> String {
    match theme {
        Theme::Enforcement => "The inquiry comes amid heightened public scrutiny of law enforcement practices. \
             Recent cases have put transparency and accountability in policing at the centre of public debate, leading to reforms in many places. \
             Legal experts note that investigations like this one often lead to improved protocols. \
             Civil rights organisations and reform advocates are following the proceedings closely.",
        Theme::International => "The international community is watching these developments closely because of what they may mean for regional stability. \
             Similar situations elsewhere have shown the value of a coordinated international response. \
             Diplomatic observers say the outcome could shape relations between several governments. \
             International organisations have signalled their willingness to assist where appropriate.",
        Theme::Economic => "Economic analysts are assessing the likely market impact, from short-term volatility to longer-term structural effects. \
             The news arrives while markets are already contending with inflation worries and trade tensions. \
             Industry experts say the lasting economic impact will depend on how quickly the underlying issues are resolved. \
             Financial institutions are monitoring the situation and revising their risk assessments.",
        Theme::General => "These developments sit within a wider period of social and political change. \
             Observers note that events like this often point to systemic issues that call for comprehensive solutions. \
             The situation has renewed calls for policy reform and stronger institutions. \
             Researchers and policy experts are studying what it could mean for public trust in the years ahead.",
    }
    .to_string()
}

fn outlook_template(category: Category) -> String {
    match category {
        Category::Enforcement => "The investigation remains ongoing, and authorities have pledged to pursue every available lead. \
             Officials have asked anyone with information to come forward. \
             Updates will be released to the public as the inquiry progresses. \
             The case is expected to continue for several weeks.",
        Category::Judicial => "The proceedings are expected to continue over the coming weeks as both sides present their arguments and evidence. \
             Further hearings have been scheduled to deal with outstanding issues. \
             The court has set a timetable intended to give every party adequate time. \
             A verdict is anticipated once all scheduled sessions and deliberations are complete.",
        _ => "Authorities continue to monitor the situation and remain ready to respond to new developments. \
             Further updates are expected as more information becomes available from official sources. \
             Officials say public communication will remain a priority throughout the response. \
             Stakeholders are expected to keep working together as the situation evolves.",
    }
    .to_string()
}
