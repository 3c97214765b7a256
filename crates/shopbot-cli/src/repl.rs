use anyhow::Result;
use std::time::Instant;

use shopbot_engine::{
    ConversationEngine, TurnReply, render_for_user, should_offer_cart, suggested_products,
};

use crate::output::{
    DEBUG_COLOR, ERROR_COLOR, NOTICE_COLOR, print_assistant, print_colored, read_input,
    read_with_default, read_yes_or_no,
};

enum CommandAction {
    Continue,
    Quit,
}

/// Interactive chat loop around a [`ConversationEngine`].
pub struct Repl {
    engine: ConversationEngine,
    assistant_name: String,
    welcome: Option<String>,
    hints: Vec<String>,
    farewell: String,
    show_function_results: bool,
    show_timing: bool,
}

impl Repl {
    pub fn new(engine: ConversationEngine) -> Self {
        Self {
            engine,
            assistant_name: "Assistant".to_string(),
            welcome: None,
            hints: vec![],
            farewell: "Goodbye!".to_string(),
            show_function_results: false,
            show_timing: false,
        }
    }

    pub fn assistant_name(mut self, name: impl Into<String>) -> Self {
        self.assistant_name = name.into();
        self
    }

    pub fn welcome(mut self, msg: impl Into<String>) -> Self {
        self.welcome = Some(msg.into());
        self
    }

    pub fn hint(mut self, msg: impl Into<String>) -> Self {
        self.hints.push(msg.into());
        self
    }

    pub fn farewell(mut self, msg: impl Into<String>) -> Self {
        self.farewell = msg.into();
        self
    }

    /// Print the customer-facing rendering of every function result.
    pub fn show_function_results(mut self) -> Self {
        self.show_function_results = true;
        self
    }

    pub fn show_timing(mut self) -> Self {
        self.show_timing = true;
        self
    }

    pub async fn run(mut self) -> Result<()> {
        if let Some(ref welcome) = self.welcome {
            print_colored(welcome, NOTICE_COLOR)?;
            println!();
        }
        self.print_help();

        loop {
            let Some(input) = read_input("You > ")? else {
                println!();
                break;
            };
            if input.is_empty() {
                continue;
            }

            match self.handle_command(&input) {
                Some(CommandAction::Quit) => {
                    println!();
                    print_colored(&self.farewell, NOTICE_COLOR)?;
                    break;
                }
                Some(CommandAction::Continue) => continue,
                None => {}
            }

            let reply = self.chat(&input).await?;

            if should_offer_cart(&reply.function_calls) {
                self.offer_cart(&reply).await?;
            }
            println!("{}", "-".repeat(80));
        }

        Ok(())
    }

    fn handle_command(&self, input: &str) -> Option<CommandAction> {
        match input.to_lowercase().as_str() {
            "quit" | "exit" | "bye" => Some(CommandAction::Quit),
            "help" | "?" => {
                self.print_help();
                Some(CommandAction::Continue)
            }
            _ => None,
        }
    }

    fn print_help(&self) {
        if !self.hints.is_empty() {
            println!("You can:");
            for hint in &self.hints {
                println!("  {}", hint);
            }
        }
        println!("Type 'help' to see this again, 'exit' to quit.");
        println!();
    }

    async fn chat(&mut self, input: &str) -> Result<TurnReply> {
        let start = Instant::now();
        let reply = self.engine.handle_turn(input).await;

        print_assistant(&self.assistant_name, &reply.text)?;
        if reply.model_error {
            print_colored("(the assistant could not reach the language model)", ERROR_COLOR)?;
        }

        if self.show_function_results {
            for result in &reply.function_calls {
                let status = if result.ok() { "ok" } else { "failed" };
                print_colored(
                    &format!("[{} {}]\n{}", result.function(), status, render_for_user(result)),
                    DEBUG_COLOR,
                )?;
            }
        }

        if self.show_timing {
            let elapsed = start.elapsed().as_secs_f64();
            match reply.usage {
                Some(usage) => println!(
                    "  ({:.1}s, {} tokens: {} prompt + {} completion)",
                    elapsed, usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
                ),
                None => println!("  ({:.1}s)", elapsed),
            }
        }
        Ok(reply)
    }

    /// Ask whether to add a product from the last listing to the cart and
    /// run the follow-up turn.
    async fn offer_cart(&mut self, reply: &TurnReply) -> Result<()> {
        if !read_yes_or_no("Would you like to add any item to your cart?")? {
            return Ok(());
        }

        let suggested = suggested_products(&reply.function_calls);
        let default_id = suggested.first().map(String::as_str).unwrap_or_default();
        let Some(product_id) = read_with_default("Enter the product ID", default_id)? else {
            return Ok(());
        };
        if product_id.is_empty() {
            return Ok(());
        }
        let Some(quantity) = read_with_default("Enter quantity", "1")? else {
            return Ok(());
        };

        self.chat(&format!(
            "Add product {} to cart, quantity {}",
            product_id, quantity
        ))
        .await?;
        Ok(())
    }
}
