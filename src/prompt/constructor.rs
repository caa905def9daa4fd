//! Prompt templating for a themed coloring book.
//!
//! The cover prompt embeds the theme and the recipient's name; page prompts
//! cycle through a fixed set of shapes by `index % 5`. Everything here is a
//! pure function of its inputs.

/// Page prompt shapes, applied in order and repeated for longer books.
const PAGE_SHAPES: [PageShape; 5] = [
    PageShape::Character,
    PageShape::Scene,
    PageShape::Pattern,
    PageShape::Creature,
    PageShape::Action,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageShape {
    Character,
    Scene,
    Pattern,
    Creature,
    Action,
}

impl PageShape {
    pub fn for_index(index: usize) -> Self {
        PAGE_SHAPES[index % PAGE_SHAPES.len()]
    }

    pub fn render(self, theme: &str) -> String {
        match self {
            PageShape::Character => format!("a cute character from {}", theme),
            PageShape::Scene => format!("a fun scene from {}", theme),
            PageShape::Pattern => format!("a simple pattern with {} elements", theme),
            PageShape::Creature => format!("a friendly creature from {}", theme),
            PageShape::Action => format!("an exciting action from {}", theme),
        }
    }
}

pub struct PromptConstructor<'a> {
    theme: &'a str,
    recipient_name: &'a str,
}

impl<'a> PromptConstructor<'a> {
    pub fn new(theme: &'a str, recipient_name: &'a str) -> Self {
        PromptConstructor { theme, recipient_name }
    }

    pub fn title(&self) -> String {
        book_title(self.theme)
    }

    pub fn cover_prompt(&self) -> String {
        format!(
            "A beautiful coloring book cover with the title \"{}\", featuring various elements of {} for a child named {}.",
            self.title(),
            self.theme,
            self.recipient_name
        )
    }

    pub fn page_prompt(&self, index: usize) -> String {
        PageShape::for_index(index).render(self.theme)
    }

    pub fn page_prompts(&self, count: usize) -> Vec<String> {
        (0..count).map(|i| self.page_prompt(i)).collect()
    }

    /// Cover first, then `page_count` pages, in submission order.
    pub fn all_prompts(&self, page_count: usize) -> Vec<String> {
        let mut prompts = Vec::with_capacity(page_count + 1);
        prompts.push(self.cover_prompt());
        prompts.extend(self.page_prompts(page_count));
        prompts
    }
}

pub fn book_title(theme: &str) -> String {
    format!("{} Adventures", theme)
}
