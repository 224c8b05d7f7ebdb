use crate::models::DataUri;

pub const DEFAULT_LANGUAGE: &str = "English";

/// Instructions for one model call, plus the image it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub instructions: String,
    pub image: Option<DataUri>,
}

/// Language to respond in: the requested one, or English when absent or blank.
pub fn effective_language(language: Option<&str>) -> &str {
    match language.map(str::trim) {
        Some(lang) if !lang.is_empty() => lang,
        _ => DEFAULT_LANGUAGE,
    }
}

pub fn language_directive(language: Option<&str>) -> String {
    format!("Respond in {}.", effective_language(language))
}

pub fn moderation_prompt(photo: DataUri) -> Prompt {
    Prompt {
        instructions: "You are a helpful image analyzer. You will analyze the image and determine if it is of food.\n\
                       \n\
                       If the image is of food, return isFood as true, and leave prompt empty.\n\
                       If the image is not of food, return isFood as false, and return a prompt to the user to upload a food image."
            .to_string(),
        image: Some(photo),
    }
}

pub fn recipe_prompt(photo: DataUri, language: Option<&str>) -> Prompt {
    Prompt {
        instructions: format!(
            "You are an expert chef. Generate a recipe based on the food image provided.\n\
             Generate the recipe in {}.\n\
             \n\
             Include a title, the ingredients with quantities, and numbered preparation steps.",
            effective_language(language)
        ),
        image: Some(photo),
    }
}

pub fn chat_prompt(question: &str, recipe: Option<&str>, language: Option<&str>) -> Prompt {
    let language_name = effective_language(language);

    let mut instructions = format!(
        "You are a helpful cooking assistant.\n\
         {}\n\
         \n\
         If the user asks something unrelated to cooking, gently remind them to stay on topic.\n\
         If the user uses mixed language (e.g., Tanglish, Hinglish, Spanglish), try to understand and respond \
         appropriately in {}, acknowledging the mixed usage if it feels natural to do so.\n",
        language_directive(language),
        language_name
    );

    // Blank recipe gets no section at all, not an empty one
    if let Some(recipe) = recipe.filter(|r| !r.trim().is_empty()) {
        instructions.push_str("\nRecipe (use as context):\n");
        instructions.push_str(recipe);
        instructions.push('\n');
    }

    instructions.push_str("\nUser's Question: ");
    instructions.push_str(question.trim());

    Prompt {
        instructions,
        image: None,
    }
}
