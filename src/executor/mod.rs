//! Execution engine for Small BASIC programs
//!
//! The executor reads one statement at a time straight from the program
//! buffer and carries it out. It owns all per-run state: the label table, the
//! variables, and three independent control-flow stacks (FOR frames, GOSUB
//! return offsets, REPEAT loop starts). Every jump is a plain assignment to
//! the tokenizer's cursor.

use crate::config::Config;
use crate::console::Console;
use crate::error::{Result, SmallBasicError};
use crate::evaluator;
use crate::labels::LabelTable;
use crate::program::Program;
use crate::tokenizer::{Delimiter, Keyword, Token, Tokenizer};
use crate::variables::Variables;

/// Active FOR loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForFrame {
    /// Slot of the control variable
    pub slot: usize,
    /// Value the control variable counts up to
    pub target: f64,
    /// Offset just after the FOR clause, where each iteration resumes
    pub resume: usize,
}

/// How a successful run finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Execution ran off the end of the program
    EndOfProgram,
    /// An END statement was executed
    End,
}

/// Non-fatal conditions reported during a run
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// INPUT received a line that is not a number; the variable kept its value
    InvalidInput { line: usize, input: String },
}

enum InputOutcome {
    Number(f64),
    Rejected(String),
}

/// Small BASIC statement executor
#[derive(Debug)]
pub struct Executor<C: Console> {
    tokenizer: Tokenizer,
    labels: LabelTable,
    variables: Variables,
    // FOR loop frames, innermost last
    for_stack: Vec<ForFrame>,
    // GOSUB return offsets
    gosub_stack: Vec<usize>,
    // REPEAT loop start offsets
    repeat_stack: Vec<usize>,
    warnings: Vec<Warning>,
    // Offset inside the statement being executed, for error reporting
    statement_start: usize,
    console: C,
    config: Config,
}

impl<C: Console> Executor<C> {
    /// Create an executor with the default configuration
    pub fn new(program: Program, console: C) -> Self {
        Self::with_config(program, console, Config::default())
    }

    /// Create an executor with a custom configuration
    pub fn with_config(program: Program, console: C, config: Config) -> Self {
        Self {
            tokenizer: Tokenizer::new(program),
            labels: LabelTable::new(),
            variables: Variables::new(),
            for_stack: Vec::new(),
            gosub_stack: Vec::new(),
            repeat_stack: Vec::new(),
            warnings: Vec::new(),
            statement_start: 0,
            console,
            config,
        }
    }

    /// Run the program from the beginning.
    ///
    /// All per-run state is rebuilt first, so a program can be run again.
    pub fn run(&mut self) -> Result<Completion> {
        self.reset()?;
        tracing::debug!(
            chars = self.tokenizer.program().len(),
            labels = self.labels.len(),
            "run started"
        );
        let completion = self.interpret()?;
        self.console
            .flush()
            .map_err(|err| SmallBasicError::OutputIo(err.to_string()))?;
        tracing::debug!(?completion, "run finished");
        Ok(completion)
    }

    fn reset(&mut self) -> Result<()> {
        self.variables.clear();
        self.for_stack.clear();
        self.gosub_stack.clear();
        self.repeat_stack.clear();
        self.warnings.clear();
        self.statement_start = 0;
        self.labels = match LabelTable::scan(&mut self.tokenizer, self.config.label_capacity) {
            Ok(labels) => labels,
            Err(err) => {
                self.statement_start = self.tokenizer.cursor();
                return Err(err);
            }
        };
        Ok(())
    }

    /// Main interpreter loop
    fn interpret(&mut self) -> Result<Completion> {
        loop {
            let token = self.tokenizer.next_token()?;
            match token {
                Token::EndOfProgram => return Ok(Completion::EndOfProgram),
                Token::Variable(_) => {
                    self.tokenizer.push_back();
                    self.statement_start = self.tokenizer.cursor();
                    self.execute_assignment()?;
                }
                Token::Keyword(keyword) => {
                    self.statement_start = self.tokenizer.cursor();
                    tracing::trace!(?keyword, offset = self.statement_start, "statement");
                    match keyword {
                        Keyword::Print => self.execute_print()?,
                        Keyword::Input => self.execute_input()?,
                        Keyword::Goto => self.execute_goto()?,
                        Keyword::If => self.execute_if()?,
                        Keyword::For => self.execute_for()?,
                        Keyword::Next => self.execute_next()?,
                        Keyword::Gosub => self.execute_gosub()?,
                        Keyword::Return => self.execute_return()?,
                        Keyword::Repeat => self.execute_repeat(),
                        Keyword::Until => self.execute_until()?,
                        Keyword::End => return Ok(Completion::End),
                        // THEN is reached after a true IF; TO on its own does nothing
                        Keyword::Then | Keyword::To => {}
                    }
                }
                // Labels, blank lines and stray delimiters
                _ => {}
            }
        }
    }

    fn evaluate(&mut self) -> Result<f64> {
        evaluator::evaluate(&mut self.tokenizer, &self.variables)
    }

    fn jump(&mut self, offset: usize) {
        tracing::trace!(from = self.tokenizer.cursor(), to = offset, "jump");
        self.tokenizer.jump(offset);
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.console
            .write_str(text)
            .map_err(|err| SmallBasicError::OutputIo(err.to_string()))
    }

    /// Read a variable name token and return its slot
    fn expect_variable(&mut self) -> Result<usize> {
        match self.tokenizer.next_token()? {
            Token::Variable(name) => Variables::slot(&name),
            other => Err(SmallBasicError::NotAVariable(other.lexeme().into_owned())),
        }
    }

    /// Consume an optional variable name (as in `NEXT I`)
    fn optional_variable(&mut self) -> Result<Option<usize>> {
        match self.tokenizer.next_token()? {
            Token::Variable(name) => Ok(Some(Variables::slot(&name)?)),
            _ => {
                self.tokenizer.push_back();
                Ok(None)
            }
        }
    }

    /// Read a label token and look it up
    fn find_label(&mut self) -> Result<usize> {
        let label = match self.tokenizer.next_token()? {
            Token::Number(label) | Token::Variable(label) => label,
            _ => return Err(SmallBasicError::Syntax),
        };
        self.labels
            .get(&label)
            .ok_or(SmallBasicError::UndefinedLabel(label))
    }

    /// Execute an assignment statement
    fn execute_assignment(&mut self) -> Result<()> {
        let slot = self.expect_variable()?;
        if !self.tokenizer.next_token()?.is_delimiter(Delimiter::Equal) {
            return Err(SmallBasicError::EqualSignExpected);
        }
        let value = self.evaluate()?;
        self.variables.set_slot(slot, value);
        Ok(())
    }

    /// Execute a PRINT statement
    fn execute_print(&mut self) -> Result<()> {
        let mut column = 0;
        let mut last_delimiter = None;

        loop {
            let token = self.tokenizer.next_token()?;
            if token.ends_line() {
                break;
            }

            let text = match token {
                Token::QuotedString(text) => text,
                _ => {
                    self.tokenizer.push_back();
                    format_number(self.evaluate()?)
                }
            };
            self.write(&text)?;
            column += text.chars().count();

            let token = self.tokenizer.next_token()?;
            last_delimiter = match token {
                Token::Delimiter(d @ (Delimiter::Comma | Delimiter::Semicolon)) => Some(d),
                _ => None,
            };
            match last_delimiter {
                Some(Delimiter::Comma) => {
                    // Move to the next tab stop
                    let tab_width = self.config.tab_width.max(1);
                    let spaces = tab_width - column % tab_width;
                    self.write(&" ".repeat(spaces))?;
                    column += spaces;
                }
                Some(_) => {
                    self.write(" ")?;
                    column += 1;
                }
                None if token.ends_line() => break,
                None => return Err(SmallBasicError::Syntax),
            }
        }

        // A trailing separator suppresses the newline
        if last_delimiter.is_none() {
            self.write("\n")?;
        }
        Ok(())
    }

    /// Execute an INPUT statement
    fn execute_input(&mut self) -> Result<()> {
        let token = self.tokenizer.next_token()?;
        if let Token::QuotedString(prompt) = token {
            self.write(&prompt)?;
            if !self.tokenizer.next_token()?.is_delimiter(Delimiter::Comma) {
                return Err(SmallBasicError::Syntax);
            }
        } else {
            self.tokenizer.push_back();
            let prompt = self.config.input_prompt.clone();
            self.write(&prompt)?;
        }
        let slot = self.expect_variable()?;

        match self.read_number()? {
            InputOutcome::Number(value) => self.variables.set_slot(slot, value),
            InputOutcome::Rejected(input) => {
                let line = self.line_number();
                tracing::warn!(line, input = %input, "non-numeric INPUT ignored");
                let message = format!("{}\n", self.config.invalid_input_message);
                self.write(&message)?;
                self.warnings.push(Warning::InvalidInput { line, input });
            }
        }
        Ok(())
    }

    fn read_number(&mut self) -> Result<InputOutcome> {
        self.console
            .flush()
            .map_err(|err| SmallBasicError::OutputIo(err.to_string()))?;
        let line = self
            .console
            .read_line()
            .map_err(|err| SmallBasicError::InputIo(err.to_string()))?
            .ok_or_else(|| SmallBasicError::InputIo("end of input".to_string()))?;
        Ok(match line.trim().parse::<f64>() {
            Ok(value) => InputOutcome::Number(value),
            Err(_) => InputOutcome::Rejected(line),
        })
    }

    /// Execute GOTO statement
    fn execute_goto(&mut self) -> Result<()> {
        let offset = self.find_label()?;
        self.jump(offset);
        Ok(())
    }

    /// Execute IF statement
    fn execute_if(&mut self) -> Result<()> {
        let condition = self.evaluate()?;
        if condition != 0.0 {
            // Fall through to the statement after THEN
            if !self.tokenizer.next_token()?.is_keyword(Keyword::Then) {
                return Err(SmallBasicError::ThenExpected);
            }
        } else {
            self.tokenizer.skip_line();
        }
        Ok(())
    }

    /// Execute FOR statement
    fn execute_for(&mut self) -> Result<()> {
        let slot = self.expect_variable()?;
        if !self.tokenizer.next_token()?.is_delimiter(Delimiter::Equal) {
            return Err(SmallBasicError::EqualSignExpected);
        }
        let start = self.evaluate()?;
        self.variables.set_slot(slot, start);

        if !self.tokenizer.next_token()?.is_keyword(Keyword::To) {
            return Err(SmallBasicError::ToExpected);
        }
        let target = self.evaluate()?;

        if start <= target {
            self.for_stack.push(ForFrame {
                slot,
                target,
                resume: self.tokenizer.cursor(),
            });
            return Ok(());
        }

        // The body never runs: resume after the next NEXT
        loop {
            match self.tokenizer.next_token()? {
                Token::Keyword(Keyword::Next) => {
                    self.optional_variable()?;
                    return Ok(());
                }
                Token::EndOfProgram => return Ok(()),
                _ => {}
            }
        }
    }

    /// Execute NEXT statement
    fn execute_next(&mut self) -> Result<()> {
        let named = self.optional_variable()?;
        let frame = self.for_stack.pop().ok_or(SmallBasicError::NextWithoutFor)?;
        if named.map_or(false, |slot| slot != frame.slot) {
            return Err(SmallBasicError::NextWithoutFor);
        }

        let value = self.variables.get_slot(frame.slot) + 1.0;
        self.variables.set_slot(frame.slot, value);
        if value > frame.target {
            return Ok(());
        }

        self.for_stack.push(frame);
        self.jump(frame.resume);
        Ok(())
    }

    /// Execute GOSUB statement
    fn execute_gosub(&mut self) -> Result<()> {
        let offset = self.find_label()?;
        self.gosub_stack.push(self.tokenizer.cursor());
        self.jump(offset);
        Ok(())
    }

    /// Execute RETURN statement
    fn execute_return(&mut self) -> Result<()> {
        let offset = self
            .gosub_stack
            .pop()
            .ok_or(SmallBasicError::ReturnWithoutGosub)?;
        self.jump(offset);
        Ok(())
    }

    /// Execute REPEAT statement
    fn execute_repeat(&mut self) {
        self.repeat_stack.push(self.tokenizer.cursor());
    }

    /// Execute UNTIL statement
    fn execute_until(&mut self) -> Result<()> {
        let start = self
            .repeat_stack
            .pop()
            .ok_or(SmallBasicError::UntilWithoutRepeat)?;
        let condition = self.evaluate()?;
        if condition == 0.0 {
            self.repeat_stack.push(start);
            self.jump(start);
        }
        Ok(())
    }

    /// Value of a variable
    pub fn variable(&self, name: &str) -> Result<f64> {
        self.variables.get(name)
    }

    /// The variable store
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// The label table built by the last run
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Current cursor offset
    pub fn cursor(&self) -> usize {
        self.tokenizer.cursor()
    }

    /// 1-based source line of the statement executed last (or that failed)
    pub fn line_number(&self) -> usize {
        self.tokenizer.program().line_at(self.statement_start)
    }

    /// Active FOR frames, innermost last
    pub fn for_frames(&self) -> &[ForFrame] {
        &self.for_stack
    }

    /// Number of pending GOSUB returns
    pub fn gosub_depth(&self) -> usize {
        self.gosub_stack.len()
    }

    /// Number of open REPEAT loops
    pub fn repeat_depth(&self) -> usize {
        self.repeat_stack.len()
    }

    /// Warnings raised by the last run
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// The console
    pub fn console(&self) -> &C {
        &self.console
    }

    /// The console, mutably
    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    /// Consume the executor and return its console
    pub fn into_console(self) -> C {
        self.console
    }
}

/// Format a number for PRINT
fn format_number(value: f64) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::BufferConsole;

    fn executor(source: &str) -> Executor<BufferConsole> {
        Executor::new(Program::new(source), BufferConsole::new())
    }

    fn run(source: &str) -> (Result<Completion>, Executor<BufferConsole>) {
        let mut executor = executor(source);
        let result = executor.run();
        (result, executor)
    }

    fn output(source: &str) -> String {
        let (result, executor) = run(source);
        result.unwrap();
        executor.console().output().to_string()
    }

    #[test]
    fn test_executor_creation() {
        let executor = executor("");
        assert!(executor.for_frames().is_empty());
        assert_eq!(executor.gosub_depth(), 0);
        assert_eq!(executor.repeat_depth(), 0);
    }

    #[test]
    fn test_empty_program() {
        let (result, _) = run("");
        assert_eq!(result, Ok(Completion::EndOfProgram));
    }

    #[test]
    fn test_assignment() {
        let (result, executor) = run("a = 2 * 3\nB = a + 1\n");
        assert_eq!(result, Ok(Completion::EndOfProgram));
        assert_eq!(executor.variable("A").unwrap(), 6.0);
        assert_eq!(executor.variable("b").unwrap(), 7.0);
    }

    #[test]
    fn test_equal_sign_expected() {
        let (result, _) = run("A 5\n");
        assert_eq!(result, Err(SmallBasicError::EqualSignExpected));
    }

    #[test]
    fn test_print_items() {
        assert_eq!(output("PRINT \"HELLO\"\n"), "HELLO\n");
        assert_eq!(output("PRINT 1 + 2\n"), "3\n");
        assert_eq!(output("PRINT 7 / 2"), "3.5\n");
        assert_eq!(output("PRINT\n"), "\n");
    }

    #[test]
    fn test_print_with_comma_and_semicolon() {
        assert_eq!(output("PRINT \"A\",1;\"B\";\n"), "A       1 B ");
        assert_eq!(output("PRINT \"A\",1;\"B\"\n"), "A       1 B\n");
        assert_eq!(output("PRINT \"ABCDEFGH\",2\n"), "ABCDEFGH        2\n");
    }

    #[test]
    fn test_print_tab_width_from_config() {
        let config = Config::default().with_tab_width(4);
        let mut executor =
            Executor::with_config(Program::new("PRINT 1,2\n"), BufferConsole::new(), config);
        executor.run().unwrap();
        assert_eq!(executor.console().output(), "1   2\n");
    }

    #[test]
    fn test_print_syntax_error() {
        let (result, _) = run("PRINT \"A\" \"B\"\n");
        assert_eq!(result, Err(SmallBasicError::Syntax));
    }

    #[test]
    fn test_end_statement() {
        let (result, executor) = run("A = 1\nEND\nA = 2\n");
        assert_eq!(result, Ok(Completion::End));
        assert_eq!(executor.variable("A").unwrap(), 1.0);
    }

    #[test]
    fn test_goto_statement() {
        let source = "GOTO 30\n20 A = 1\n30 B = 2\n";
        let (result, executor) = run(source);
        result.unwrap();
        assert_eq!(executor.variable("A").unwrap(), 0.0);
        assert_eq!(executor.variable("B").unwrap(), 2.0);
    }

    #[test]
    fn test_goto_undefined_label() {
        let (result, executor) = run("A = 1\nGOTO 99\nB = 2\n");
        assert_eq!(result, Err(SmallBasicError::UndefinedLabel("99".to_string())));
        assert_eq!(executor.variable("B").unwrap(), 0.0);
        assert_eq!(executor.line_number(), 2);
    }

    #[test]
    fn test_goto_without_label() {
        let (result, executor) = run("A = 1\nGOTO\nB = 2\n");
        assert_eq!(result, Err(SmallBasicError::Syntax));
        assert_eq!(executor.line_number(), 2);
        assert_eq!(run("GOSUB \"10\"\n").0, Err(SmallBasicError::Syntax));
    }

    #[test]
    fn test_if_false_with_carriage_return_lines() {
        let (result, executor) = run("IF 0 THEN A = 1\rB = 2\n");
        result.unwrap();
        assert_eq!(executor.variable("A").unwrap(), 0.0);
        assert_eq!(executor.variable("B").unwrap(), 2.0);
    }

    #[test]
    fn test_duplicate_label_stops_before_execution() {
        let (result, executor) = run("A = 1\n10 B = 2\n10 C = 3\n");
        assert_eq!(result, Err(SmallBasicError::DuplicateLabel("10".to_string())));
        assert_eq!(executor.variable("A").unwrap(), 0.0);
        assert_eq!(executor.line_number(), 3);
    }

    #[test]
    fn test_if_then() {
        let source = "IF 1 < 2 THEN A = 1\nIF 2 < 1 THEN B = 1\nC = 1\n";
        let (result, executor) = run(source);
        result.unwrap();
        assert_eq!(executor.variable("A").unwrap(), 1.0);
        assert_eq!(executor.variable("B").unwrap(), 0.0);
        assert_eq!(executor.variable("C").unwrap(), 1.0);
    }

    #[test]
    fn test_then_expected() {
        let (result, _) = run("IF 1 PRINT 2\n");
        assert_eq!(result, Err(SmallBasicError::ThenExpected));
    }

    #[test]
    fn test_for_next() {
        let (result, executor) = run("FOR I = 1 TO 3\nPRINT I\nNEXT\n");
        result.unwrap();
        assert_eq!(executor.console().output(), "1\n2\n3\n");
        assert_eq!(executor.variable("I").unwrap(), 4.0);
        assert!(executor.for_frames().is_empty());
    }

    #[test]
    fn test_for_skips_body_when_start_exceeds_target() {
        let (result, executor) = run("FOR I = 5 TO 1\nPRINT I\nNEXT\nPRINT \"DONE\"\n");
        result.unwrap();
        assert_eq!(executor.console().output(), "DONE\n");
        assert_eq!(executor.variable("I").unwrap(), 5.0);
    }

    #[test]
    fn test_next_with_variable() {
        let (result, executor) = run("FOR J = 1 TO 2\nPRINT J;\nNEXT J\nFOR K = 3 TO 1\nNEXT K\n");
        result.unwrap();
        assert_eq!(executor.console().output(), "1 2 ");
    }

    #[test]
    fn test_next_with_wrong_variable() {
        let (result, _) = run("FOR J = 1 TO 2\nNEXT K\n");
        assert_eq!(result, Err(SmallBasicError::NextWithoutFor));
    }

    #[test]
    fn test_next_without_for() {
        let (result, _) = run("NEXT\n");
        assert_eq!(result, Err(SmallBasicError::NextWithoutFor));
    }

    #[test]
    fn test_for_errors() {
        assert_eq!(
            run("FOR 1 = 1 TO 2\n").0,
            Err(SmallBasicError::NotAVariable("1".to_string()))
        );
        assert_eq!(
            run("FOR I 1 TO 2\n").0,
            Err(SmallBasicError::EqualSignExpected)
        );
        assert_eq!(run("FOR I = 1, 2\n").0, Err(SmallBasicError::ToExpected));
    }

    #[test]
    fn test_gosub_return() {
        let source = "GOSUB 100\nPRINT \"BACK\"\nEND\n100 PRINT \"SUB\"\nRETURN\n";
        assert_eq!(output(source), "SUB\nBACK\n");
    }

    #[test]
    fn test_return_without_gosub() {
        let (result, executor) = run("A = 1\nRETURN\n");
        assert_eq!(result, Err(SmallBasicError::ReturnWithoutGosub));
        assert_eq!(executor.line_number(), 2);
    }

    #[test]
    fn test_repeat_until() {
        let (result, executor) = run("REPEAT\nC = C + 1\nUNTIL C = 3\nPRINT C\n");
        result.unwrap();
        assert_eq!(executor.console().output(), "3\n");
        assert_eq!(executor.repeat_depth(), 0);
    }

    #[test]
    fn test_until_without_repeat() {
        let (result, _) = run("UNTIL 1\n");
        assert_eq!(result, Err(SmallBasicError::UntilWithoutRepeat));
    }

    #[test]
    fn test_input_with_prompt() {
        let console = BufferConsole::with_input(["42"]);
        let mut executor = Executor::new(Program::new("INPUT \"AGE\", A\nPRINT A\n"), console);
        executor.run().unwrap();
        assert_eq!(executor.console().output(), "AGE42\n");
        assert_eq!(executor.variable("A").unwrap(), 42.0);
    }

    #[test]
    fn test_input_default_prompt() {
        let console = BufferConsole::with_input([" 2.5 "]);
        let mut executor = Executor::new(Program::new("INPUT X\n"), console);
        executor.run().unwrap();
        assert_eq!(executor.console().output(), "? ");
        assert_eq!(executor.variable("X").unwrap(), 2.5);
    }

    #[test]
    fn test_input_invalid_number_is_a_warning() {
        let console = BufferConsole::with_input(["abc"]);
        let mut executor = Executor::new(Program::new("X = 7\nINPUT X\nPRINT X\n"), console);
        assert_eq!(executor.run(), Ok(Completion::EndOfProgram));
        assert_eq!(executor.console().output(), "? Invalid input.\n7\n");
        assert_eq!(executor.variable("X").unwrap(), 7.0);
        assert_eq!(
            executor.warnings(),
            &[Warning::InvalidInput {
                line: 2,
                input: "abc".to_string()
            }]
        );
    }

    #[test]
    fn test_input_at_end_of_input() {
        let (result, _) = run("INPUT X\n");
        assert!(matches!(result, Err(SmallBasicError::InputIo(_))));
    }

    #[test]
    fn test_input_prompt_requires_comma() {
        let console = BufferConsole::with_input(["1"]);
        let mut executor = Executor::new(Program::new("INPUT \"N\" X\n"), console);
        assert_eq!(executor.run(), Err(SmallBasicError::Syntax));
    }

    #[test]
    fn test_run_twice_resets_state() {
        let mut executor = executor("A = A + 1\nPRINT A\n");
        executor.run().unwrap();
        executor.run().unwrap();
        assert_eq!(executor.console().output(), "1\n1\n");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(8.0), "8");
        assert_eq!(format_number(-0.25), "-0.25");
    }
}
