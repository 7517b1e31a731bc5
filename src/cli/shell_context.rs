use strsim::levenshtein;

use crate::{
    config::{Config, ConfigManager},
    core::{
        allocation::{monthly_amount, round_currency},
        manager::{BudgetManager, Outcome},
        presentation::{EntityRegistry, InMemorySink},
        Command,
    },
    storage::JsonStorage,
};

use super::{
    commands::{self, COMMANDS},
    output::{self, render_table},
    CliError, CommandError, LoopControl,
};

pub struct ShellContext {
    pub manager: BudgetManager<InMemorySink>,
    pub config: Config,
    pub running: bool,
}

impl ShellContext {
    /// Opens the data directory (`BUDGET_MANAGER_HOME` or `~/.budget_manager`) and sets
    /// up the manager with a file-backed entity registry. A missing config file is
    /// written with the defaults so it can be edited.
    pub fn new() -> Result<Self, CliError> {
        let config_manager = ConfigManager::new()?;
        let config = config_manager.load()?;
        if !config_manager.path().exists() {
            config_manager.save(&config)?;
        }
        let storage = JsonStorage::new(
            Some(config_manager.base_dir().to_path_buf()),
            Some(&config.storage_key),
        )?;
        let registry = match config_manager.registry_path(&config) {
            Some(path) => EntityRegistry::open(&path)?,
            None => EntityRegistry::in_memory(),
        };
        let sink = InMemorySink::with_registry(registry);
        let manager = BudgetManager::setup(Box::new(storage), sink, &config)?;
        Ok(Self {
            manager,
            config,
            running: true,
        })
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        commands::command_names()
    }

    pub fn prompt(&self) -> String {
        format!("budget ({} items)> ", self.manager.store().items().len())
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        match command {
            "add" => self.run(commands::add(args)?),
            "update" => self.run(commands::update(args)?),
            "update-by-name" => self.run(commands::update_by_name(args)?),
            "remove" => self.run(commands::remove(args)?),
            "remove-by-name" => self.run(commands::remove_by_name(args)?),
            "clear" => self.run(Command::Clear),
            "rebuild" => self.run(Command::RebuildEntities),
            "participants" if args.is_empty() => {
                self.show_participants();
                Ok(LoopControl::Continue)
            }
            "participants" => self.run(commands::set_participants(args)?),
            "overview" => {
                self.show_overview()?;
                Ok(LoopControl::Continue)
            }
            "items" => {
                self.show_items();
                Ok(LoopControl::Continue)
            }
            "call" => self.run(commands::raw_call(args)?),
            "help" => {
                self.show_help(args.first().copied());
                Ok(LoopControl::Continue)
            }
            "exit" | "quit" => Ok(LoopControl::Exit),
            _ => {
                self.suggest_command(raw);
                Ok(LoopControl::Continue)
            }
        }
    }

    fn run(&mut self, command: Command) -> Result<LoopControl, CommandError> {
        let service = command.service();
        match self.manager.handle(command)? {
            Outcome::Applied => output::success(format!("`{}` applied.", service)),
            Outcome::Rebuilt(report) => output::success(format!(
                "Entities rebuilt: {} added, {} removed, {} refreshed.",
                report.added.len(),
                report.removed.len(),
                report.refreshed
            )),
            Outcome::Ignored(reason) => {
                output::warning(format!("`{}` ignored: {}", service, reason))
            }
        }
        Ok(LoopControl::Continue)
    }

    fn show_participants(&self) {
        let participants = self.manager.store().participants();
        output::section("Participants");
        for name in participants {
            println!("  {}", name);
        }
        output::info(format!("Shared label: {}", participants.group_label()));
    }

    fn show_overview(&self) -> Result<(), CommandError> {
        let overview = self.manager.with_sink(|sink| sink.overview().cloned())?;
        let Some(overview) = overview else {
            output::warning("Overview is not published.");
            return Ok(());
        };
        output::section(&overview.name);
        println!(
            "Total monthly: {:.2} {}",
            overview.state.unwrap_or_default(),
            overview.unit
        );
        if let Some(attributes) = overview.overview_attributes() {
            for (participant, amount) in attributes.totals.iter() {
                println!("  {}: {:.2}", participant, amount);
            }
        }
        Ok(())
    }

    fn show_items(&self) {
        let document = self.manager.store().document();
        if document.items.is_empty() {
            output::info("No expenses recorded.");
            return;
        }
        let rows: Vec<Vec<String>> = document
            .items
            .iter()
            .map(|item| {
                let monthly = monthly_amount(item.amount, &item.frequency);
                vec![
                    item.id.to_string(),
                    item.name.clone(),
                    format!("{:.2}", item.amount),
                    item.frequency.to_string(),
                    item.payer.clone(),
                    format!("{:.2}", round_currency(monthly)),
                ]
            })
            .collect();
        let amount_header = format!("Amount ({})", self.config.currency);
        let monthly_header = format!("Monthly ({})", self.config.unit());
        let headers = [
            "Id",
            "Name",
            amount_header.as_str(),
            "Frequency",
            "Payer",
            monthly_header.as_str(),
        ];
        output::section("Expenses");
        println!("{}", render_table(&headers, &rows));
    }

    fn show_help(&self, topic: Option<&str>) {
        if let Some(topic) = topic {
            match commands::find_spec(&topic.to_lowercase()) {
                Some(spec) => {
                    println!("{}", spec.usage);
                    println!("  {}", spec.summary);
                }
                None => self.suggest_command(topic),
            }
            return;
        }
        output::section("Commands");
        for spec in COMMANDS {
            println!("  {:<16} {}", spec.name, spec.summary);
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let best = COMMANDS
            .iter()
            .map(|spec| (levenshtein(spec.name, &needle), spec.name))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, name)) = best {
            if distance <= 3 {
                output::info(format!("Suggestion: `{}`?", name));
            }
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::info("Use `help <command>` for usage details.");
            }
            CommandError::Core(err) if err.is_soft() => output::warning(err),
            CommandError::Core(err) => output::error(err),
        }
    }
}
