//! Built-in prompt templates

use std::collections::HashMap;

use super::schema::TemplateName;

const SYSTEM_PROMPT: &str = r#"You are a {role} promoting affiliate products on social media.
Today's date is {today_date}.
Your goal is to maximize {metric_name} within {time}
You are currently at {metric_state}"#;

const RESEARCH_CODE_PROMPT_FIRST: &str = r#"You know nothing about your environment.
What do you do now?
You can use the following APIs to do research:
<APIs>
{apis_str}
</APIs>
You are to print for everything, and raise every error or unexpected behavior of the program.
Please write code using the format below to research the state of the market.
```python
from dotenv import load_dotenv
import ...

load_dotenv()

def main():
    ....

main()
```"#;

const RESEARCH_CODE_PROMPT: &str = r#"Here is what is going on in your environment right now :
<LatestNotification>
{notifications_str}
</LatestNotification>
Here is what you just tried :
<PrevStrategy>
{prev_strategy}
</PrevStrategy>
For reference, in the past when you encountered a similar situation you reasoned as follows:
<RAG>
{rag_summary}
</RAG>
The result of this RAG was
<BeforeStrategyExecution>
{before_metric_state}
</BeforeStrategyExecution>
<AfterStrategyExecution>
{after_metric_state}
</AfterStrategyExecution>
You are to print for everything, and raise every error or unexpected behavior of the program.
Please write code using format below to research what is going on in the world and how best to react to it.
```python
from dotenv import load_dotenv
import ...

load_dotenv()

def main():
    ....

main()
```"#;

const STRATEGY_PROMPT: &str = r#"You just learnt the following information:
<LatestNotification>
{notifications_str}
</LatestNotification>
<ResearchOutput>
{research_output_str}
</ResearchOutput>
Decide what what you should do to help you maximize {metric_name} within {time}.
Choose one action and write a short paragraph explaining how you will do it."#;

const AFFILIATE_PROMOTER_CODE_PROMPT: &str = r#"Please write code to implement this strategy:
<Strategy>
{strategy_output}
</Strategy>
You have the following APIs:
<APIs>
{apis_str}
</APIs>
Format the code as follows:
```python
from dotenv import load_dotenv
import ...

load_dotenv()

def main():
    ....

main()
```"#;

const REGEN_CODE_PROMPT: &str = r#"Given these errors:
<Errors>
{errors}
</Errors>
And the code it's from:
<Code>
{previous_code}
</Code>
You are to generate code that fixes the error but doesn't stray too much from the original code, in this format:
```python
from dotenv import load_dotenv
import ...

load_dotenv()

def main():
    ....

main()
```
Please generate the code."#;

/// API descriptor offered to the model when the caller supplies none
pub const DEFAULT_API_DESCRIPTOR: &str = r##"Twitter API v1.1:
Required env vars:
- TWITTER_API_KEY
- TWITTER_API_KEY_SECRET
- TWITTER_ACCESS_TOKEN
- TWITTER_ACCESS_TOKEN_SECRET

Example Usage:
import tweepy
import os
from dotenv import load_dotenv

def main():
    load_dotenv()

    # Initialize Twitter API v1.1 (not v2)
    auth = tweepy.OAuth1UserHandler(
        os.getenv("TWITTER_API_KEY"),
        os.getenv("TWITTER_API_KEY_SECRET"),
        os.getenv("TWITTER_ACCESS_TOKEN"),
        os.getenv("TWITTER_ACCESS_TOKEN_SECRET")
    )
    api = tweepy.API(auth)

    try:
        tweet = api.update_status("Check out today's best deals")
        print(f"Posted to Twitter: {tweet.text}")
    except Exception as e:
        print(f"Error posting to Twitter: {str(e)}")
        raise

if __name__ == "__main__":
    main()"##;

/// Body of the built-in template for `name`
pub fn default_template(name: TemplateName) -> &'static str {
    match name {
        TemplateName::SystemPrompt => SYSTEM_PROMPT,
        TemplateName::ResearchCodePromptFirst => RESEARCH_CODE_PROMPT_FIRST,
        TemplateName::ResearchCodePrompt => RESEARCH_CODE_PROMPT,
        TemplateName::StrategyPrompt => STRATEGY_PROMPT,
        TemplateName::AffiliatePromoterCodePrompt => AFFILIATE_PROMOTER_CODE_PROMPT,
        TemplateName::RegenCodePrompt => REGEN_CODE_PROMPT,
    }
}

/// The complete built-in template set, keyed the way custom sets are
pub fn default_prompts() -> HashMap<String, String> {
    TemplateName::ALL
        .into_iter()
        .map(|name| (name.as_str().to_string(), default_template(name).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::schema::extract_placeholders;

    #[test]
    fn test_defaults_agree_with_schema() {
        for name in TemplateName::ALL {
            assert_eq!(
                extract_placeholders(default_template(name)),
                name.required_set(),
                "default {} drifted from its declared placeholders",
                name
            );
        }
    }

    #[test]
    fn test_default_prompts_cover_every_template() {
        let prompts = default_prompts();
        assert_eq!(prompts.len(), TemplateName::ALL.len());
        assert!(prompts.contains_key("regen_code_prompt"));
    }
}
