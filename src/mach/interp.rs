use super::{
    expr, Console, Heap, HeapStr, Input, Program, Scope, Storage, Val, Vars, SCREEN_COLS,
    SCREEN_ROWS,
};
use crate::error;
use crate::lang::{leading_line_number, Error, Lexer, LineNumber, Operator, Token, Word};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Result<T> = std::result::Result<T, Error>;

/// Nesting ceiling for the call and loop stacks.
const MAX_DEPTH: usize = 256;

/// POKE here sets the background color instead of writing screen
/// memory, as on the hardware being emulated.
const BACKGROUND_REGISTER: i64 = 53281;

pub const HELP_TEXT: &str = "AVAILABLE COMMANDS:\n\
                             \x20LIST, RUN, NEW, LOAD, SAVE, EXIT, HELP\n\
                             \x20PRINT, INPUT, LET, GOTO, GOSUB, RETURN\n\
                             \x20IF...THEN...ELSE, FOR...NEXT, DO...LOOP\n\
                             \x20WHILE...WEND, REPEAT...UNTIL, REM, POKE\n\
                             \x20GRAPHICS: PLOT, DRAW\n\
                             \x20FUNCTIONS: PEEK, ABS, INT, RND, SIN, COS, TAN, SQR\n\
                             \x20           LEN, LEFT$, RIGHT$, MID$, STR$, VAL, CHR$, ASC\n";

/// A resumable point in the program: which line, the line's text, and
/// a byte offset into it. Immediate-mode positions carry `None` for
/// the line number and keep their text alive through the `Rc`.
#[derive(Debug, Clone)]
struct Position {
    line: LineNumber,
    text: Rc<HeapStr>,
    offset: usize,
}

#[derive(Debug, Clone)]
enum Frame {
    For {
        var: Rc<str>,
        limit: f64,
        step: f64,
        body: Position,
    },
    While {
        header: Position,
    },
    Repeat {
        body: Position,
    },
}

impl Frame {
    fn position(&self) -> &Position {
        match self {
            Frame::For { body, .. } => body,
            Frame::While { header } => header,
            Frame::Repeat { body } => body,
        }
    }
}

/// What a statement asks the driver loop to do next.
enum Flow {
    /// Keep executing the current statement list.
    Continue,
    /// Fall through to the next stored line.
    Next,
    /// Transfer to a stored line by number.
    Jump(u16),
    /// Transfer to an exact saved position.
    Resume(Position),
    /// Terminate the run normally.
    Halt,
}

/// What `enter` did with a line of input.
#[derive(Debug, PartialEq)]
pub enum Entered {
    /// The line carried a line number and went to the program store.
    Stored,
    /// The line was performed as an immediate command.
    Performed,
}

/// ## The execution engine
///
/// Owns all interpreter state; the terminal is borrowed per call and
/// persistence is injected at construction. The break flag is the one
/// piece of state written from outside the execution thread, so it is
/// an atomic handed in by the host.
pub struct Interp {
    heap: Heap,
    program: Program,
    vars: Vars,
    gosub: Vec<Position>,
    loops: Vec<Frame>,
    breaker: Arc<AtomicBool>,
    storage: Box<dyn Storage>,
    exit_requested: bool,
}

impl Interp {
    pub fn new(
        memory_limit: usize,
        breaker: Arc<AtomicBool>,
        storage: Box<dyn Storage>,
    ) -> Result<Interp> {
        let heap = Heap::new(memory_limit);
        let vars = Vars::new(&heap)?;
        Ok(Interp {
            heap,
            program: Program::new(),
            vars,
            gosub: Vec::new(),
            loops: Vec::new(),
            breaker,
            storage,
            exit_requested: false,
        })
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Accept one line of input: numbered lines go to the program
    /// store, everything else is performed immediately.
    pub fn enter(&mut self, line: &str, console: &mut dyn Console) -> Result<Entered> {
        if let Some((number, rest)) = leading_line_number(line) {
            self.program.store(&self.heap.clone(), number, rest)?;
            return Ok(Entered::Stored);
        }
        self.immediate(line, console)?;
        Ok(Entered::Performed)
    }

    /// Immediate-only commands are recognized before generic statement
    /// dispatch, mirroring the classic direct-mode table.
    fn immediate(&mut self, line: &str, console: &mut dyn Console) -> Result<()> {
        let heap = self.heap.clone();
        let mut lexer = Lexer::new(&heap, line);
        let word = match lexer.peek()? {
            Token::Word(word) => Some(*word),
            _ => None,
        };
        match word {
            Some(Word::List) => {
                lexer.next()?;
                self.list(&mut lexer, console)
            }
            Some(Word::Run) => {
                lexer.next()?;
                Self::end_of_line(&mut lexer)?;
                self.run(console)
            }
            Some(Word::New) => {
                lexer.next()?;
                Self::end_of_line(&mut lexer)?;
                self.clear_all();
                Ok(())
            }
            Some(Word::Load) => {
                lexer.next()?;
                let name = Self::filename(&mut lexer)?;
                Self::end_of_line(&mut lexer)?;
                self.load(&name)
            }
            Some(Word::Save) => {
                lexer.next()?;
                let name = Self::filename(&mut lexer)?;
                Self::end_of_line(&mut lexer)?;
                self.save(&name)
            }
            Some(Word::Exit) => {
                lexer.next()?;
                Self::end_of_line(&mut lexer)?;
                self.exit_requested = true;
                Ok(())
            }
            Some(Word::Help) => {
                lexer.next()?;
                Self::end_of_line(&mut lexer)?;
                console.print(HELP_TEXT);
                Ok(())
            }
            Some(Word::Memchk) => {
                lexer.next()?;
                Self::end_of_line(&mut lexer)?;
                console.print(&format!("{}\n", self.heap.statistics()));
                Ok(())
            }
            Some(Word::Clr) => {
                lexer.next()?;
                Self::end_of_line(&mut lexer)?;
                console.clear();
                Ok(())
            }
            _ => {
                let text = Rc::new(HeapStr::copy_of(&heap, line)?);
                let result = self.perform(
                    Position {
                        line: None,
                        text,
                        offset: 0,
                    },
                    console,
                );
                // Frames recorded inside an immediate line cannot be
                // resumed once its text is gone.
                self.drop_immediate_frames();
                result
            }
        }
    }

    fn filename(lexer: &mut Lexer) -> Result<String> {
        match lexer.next()? {
            Token::Str(s) => Ok(s.as_str().to_string()),
            _ => Err(error!(Syntax; "FILENAME REQUIRED")),
        }
    }

    /// Immediate commands own their whole line; trailing text is a
    /// syntax error rather than silently dropped.
    fn end_of_line(lexer: &mut Lexer) -> Result<()> {
        match lexer.peek()? {
            Token::End => Ok(()),
            _ => Err(error!(Syntax; "UNEXPECTED TOKEN")),
        }
    }

    /// RUN: reset variables and stacks, then execute from the lowest
    /// stored line. Running off the end terminates normally.
    pub fn run(&mut self, console: &mut dyn Console) -> Result<()> {
        self.vars.clear();
        self.gosub.clear();
        self.loops.clear();
        match self.program.first() {
            Some((number, text)) => self.perform(
                Position {
                    line: Some(number),
                    text,
                    offset: 0,
                },
                console,
            ),
            None => Ok(()),
        }
    }

    /// Replace the program with the contents of a stored file.
    pub fn load(&mut self, name: &str) -> Result<()> {
        let lines = self.storage.load(name)?;
        self.clear_all();
        let heap = self.heap.clone();
        for line in &lines {
            if line.trim().is_empty() {
                continue;
            }
            match leading_line_number(line) {
                Some((number, rest)) => self.program.store(&heap, number, rest)?,
                None => {
                    self.program.clear();
                    return Err(error!(IoError; "BAD PROGRAM FILE"));
                }
            }
        }
        Ok(())
    }

    pub fn save(&mut self, name: &str) -> Result<()> {
        if self.program.is_empty() {
            return Err(error!(IoError; "NOTHING TO SAVE"));
        }
        let lines: Vec<String> = self
            .program
            .iter()
            .map(|(number, text)| format!("{} {}", number, text))
            .collect();
        self.storage.save(name, &lines)
    }

    fn clear_all(&mut self) {
        self.program.clear();
        self.vars.clear();
        self.gosub.clear();
        self.loops.clear();
    }

    fn drop_immediate_frames(&mut self) {
        self.gosub.retain(|position| position.line.is_some());
        self.loops.retain(|frame| frame.position().line.is_some());
    }

    fn list(&mut self, lexer: &mut Lexer, console: &mut dyn Console) -> Result<()> {
        let mut start = 0u16;
        let mut end: Option<u16> = None;
        if let Token::Number(_) = lexer.peek()? {
            start = self.take_line_number(lexer)?;
            match lexer.peek()? {
                Token::Comma | Token::Operator(Operator::Minus) => {
                    lexer.next()?;
                    if let Token::Number(_) = lexer.peek()? {
                        end = Some(self.take_line_number(lexer)?);
                    }
                }
                _ => {}
            }
        }
        Self::end_of_line(lexer)?;
        for (number, text) in self.program.range(start, end) {
            console.print(&format!("{} {}\n", number, text));
        }
        Ok(())
    }

    fn take_line_number(&mut self, lexer: &mut Lexer) -> Result<u16> {
        match lexer.next()? {
            Token::Number(n) => Val::Number(n).line_number(),
            _ => Err(error!(Syntax; "INVALID LINE NUMBER")),
        }
    }

    /// The driver loop: execute statement lists, follow the flow each
    /// one produces, stop on halt or fall-through past the last line.
    fn perform(&mut self, start: Position, console: &mut dyn Console) -> Result<()> {
        let mut position = start;
        loop {
            let line = position.line;
            let flow = self
                .chunk(&position, console)
                .map_err(|error| error.located(line))?;
            position = match flow {
                Flow::Next => match line.and_then(|n| self.program.next_after(n)) {
                    Some((number, text)) => Position {
                        line: Some(number),
                        text,
                        offset: 0,
                    },
                    None => return Ok(()),
                },
                Flow::Jump(target) => self
                    .line_position(target)
                    .map_err(|error| error.located(line))?,
                Flow::Resume(saved) => saved,
                Flow::Halt => return Ok(()),
                Flow::Continue => unreachable!("chunk never yields Continue"),
            };
        }
    }

    fn line_position(&self, number: u16) -> Result<Position> {
        match self.program.get(number) {
            Some(text) => Ok(Position {
                line: Some(number),
                text,
                offset: 0,
            }),
            None => Err(error!(UndefinedStatement)),
        }
    }

    /// Execute the statement list starting at a position, to the end
    /// of its line or the first redirecting statement. The break flag
    /// is polled before every statement.
    fn chunk(&mut self, position: &Position, console: &mut dyn Console) -> Result<Flow> {
        let heap = self.heap.clone();
        let text = position.text.clone();
        let mut lexer = Lexer::from_offset(&heap, &text, position.offset);
        loop {
            self.check_break()?;
            match lexer.peek()? {
                Token::End => return Ok(Flow::Next),
                Token::Colon => {
                    lexer.next()?;
                }
                // Reaching ELSE at a statement boundary means the THEN
                // branch ran; the rest of the line is the other arm.
                Token::Word(Word::Else) => return Ok(Flow::Next),
                _ => {
                    let statement_start = lexer.offset();
                    match self.statement(&mut lexer, position, statement_start, console)? {
                        Flow::Continue => {}
                        flow => return Ok(flow),
                    }
                }
            }
        }
    }

    fn check_break(&self) -> Result<()> {
        if self.breaker.swap(false, Ordering::SeqCst) {
            return Err(error!(Break));
        }
        Ok(())
    }

    fn statement(
        &mut self,
        lexer: &mut Lexer,
        position: &Position,
        statement_start: usize,
        console: &mut dyn Console,
    ) -> Result<Flow> {
        let word = match lexer.peek()? {
            Token::Ident(_) => return self.assign(lexer, console),
            Token::Word(word) => *word,
            _ => return Err(error!(Syntax; "EXPECTED STATEMENT")),
        };
        lexer.next()?;
        use Word::*;
        match word {
            Print => self.print(lexer, console),
            Input => self.input(lexer, console),
            Let => self.assign(lexer, console),
            Goto => self.goto(lexer, console),
            Gosub => self.gosub_call(lexer, position, console),
            Return => self.gosub_return(),
            If => self.if_then(lexer, console),
            For => self.for_header(lexer, position, console),
            Next => self.for_next(lexer),
            While => self.while_header(lexer, position, statement_start, console),
            Wend => self.wend(),
            Repeat | Do => self.repeat_header(lexer, position),
            Until => self.until(lexer, console),
            Loop => self.repeat_loop(lexer, console),
            Rem => Ok(Flow::Continue),
            End => Ok(Flow::Halt),
            Poke => self.poke(lexer, console),
            Plot => self.plot(lexer, console),
            Draw => self.draw(lexer, console),
            Else | Then | To | Step => Err(error!(Syntax; "EXPECTED STATEMENT")),
            List | Run | New | Load | Save | Exit | Help | Clr | Memchk => {
                Err(error!(Syntax; "DIRECT COMMAND IN PROGRAM"))
            }
        }
    }

    fn eval(&mut self, lexer: &mut Lexer, console: &mut dyn Console) -> Result<Val> {
        let heap = self.heap.clone();
        let mut scope = Scope {
            heap: &heap,
            vars: &mut self.vars,
            console,
        };
        expr::evaluate(&mut scope, lexer)
    }

    fn eval_list(&mut self, lexer: &mut Lexer, console: &mut dyn Console) -> Result<Vec<Val>> {
        let heap = self.heap.clone();
        let mut scope = Scope {
            heap: &heap,
            vars: &mut self.vars,
            console,
        };
        expr::evaluate_list(&mut scope, lexer)
    }

    fn print(&mut self, lexer: &mut Lexer, console: &mut dyn Console) -> Result<Flow> {
        let mut out = String::new();
        let mut newline = true;
        loop {
            match lexer.peek()? {
                Token::End | Token::Colon | Token::Word(Word::Else) => {
                    if newline {
                        out.push('\n');
                    }
                    console.print(&out);
                    return Ok(Flow::Continue);
                }
                Token::Semicolon => {
                    lexer.next()?;
                    newline = false;
                }
                Token::Comma => {
                    lexer.next()?;
                    out.push('\t');
                    newline = false;
                }
                _ => {
                    let val = self.eval(lexer, console)?;
                    out.push_str(&val.to_string());
                    newline = true;
                }
            }
        }
    }

    fn input(&mut self, lexer: &mut Lexer, console: &mut dyn Console) -> Result<Flow> {
        let mut prompt = String::from("? ");
        if let Token::Str(_) = lexer.peek()? {
            if let Token::Str(text) = lexer.next()? {
                prompt = format!("{}? ", text);
            }
            lexer.expect(Token::Semicolon)?;
        }
        let mut targets: Vec<(String, Option<Vec<Val>>)> = vec![];
        loop {
            let name = match lexer.next()? {
                Token::Ident(name) => name.as_str().to_string(),
                _ => return Err(error!(Syntax; "EXPECTED VARIABLE")),
            };
            let subscripts = if *lexer.peek()? == Token::LParen {
                Some(self.eval_list(lexer, console)?)
            } else {
                None
            };
            targets.push((name, subscripts));
            if *lexer.peek()? == Token::Comma {
                lexer.next()?;
                continue;
            }
            break;
        }
        let mut values: Vec<String> = vec![];
        while values.len() < targets.len() {
            let line = match console.read_line(&prompt) {
                Input::Line(line) => line,
                Input::Break | Input::Eof => return Err(error!(Break)),
            };
            values.extend(line.split(',').map(|v| v.trim().to_string()));
            prompt = String::from("?? ");
        }
        if values.len() > targets.len() {
            console.print("?EXTRA IGNORED\n");
        }
        let heap = self.heap.clone();
        for ((name, subscripts), value) in targets.into_iter().zip(values) {
            let val = if name.ends_with('$') {
                Val::String(Rc::new(HeapStr::copy_of(&heap, &value)?))
            } else {
                match value.parse::<f64>() {
                    Ok(n) if n.is_finite() => Val::Number(n),
                    _ => return Err(error!(TypeMismatch; "INVALID NUMERIC INPUT")),
                }
            };
            match subscripts {
                Some(subscripts) => self.vars.store_element(&name, subscripts, val)?,
                None => self.vars.store(&name, val)?,
            }
        }
        Ok(Flow::Continue)
    }

    fn assign(&mut self, lexer: &mut Lexer, console: &mut dyn Console) -> Result<Flow> {
        let name = match lexer.next()? {
            Token::Ident(name) => name,
            _ => return Err(error!(Syntax; "EXPECTED VARIABLE")),
        };
        let subscripts = if *lexer.peek()? == Token::LParen {
            Some(self.eval_list(lexer, console)?)
        } else {
            None
        };
        lexer.expect(Token::Operator(Operator::Equal))?;
        let value = self.eval(lexer, console)?;
        match subscripts {
            Some(subscripts) => self.vars.store_element(&name, subscripts, value)?,
            None => self.vars.store(&name, value)?,
        }
        Ok(Flow::Continue)
    }

    fn goto(&mut self, lexer: &mut Lexer, console: &mut dyn Console) -> Result<Flow> {
        let target = self.eval(lexer, console)?.line_number()?;
        Ok(Flow::Jump(target))
    }

    fn gosub_call(
        &mut self,
        lexer: &mut Lexer,
        position: &Position,
        console: &mut dyn Console,
    ) -> Result<Flow> {
        let target = self.eval(lexer, console)?.line_number()?;
        if self.gosub.len() >= MAX_DEPTH {
            return Err(error!(OutOfMemory; "TOO MANY NESTED GOSUBS"));
        }
        self.gosub.push(Position {
            line: position.line,
            text: position.text.clone(),
            offset: lexer.offset(),
        });
        Ok(Flow::Jump(target))
    }

    fn gosub_return(&mut self) -> Result<Flow> {
        match self.gosub.pop() {
            Some(saved) => Ok(Flow::Resume(saved)),
            None => Err(error!(ReturnWithoutGosub)),
        }
    }

    fn if_then(&mut self, lexer: &mut Lexer, console: &mut dyn Console) -> Result<Flow> {
        let condition = self.eval(lexer, console)?.number()? != 0.0;
        lexer.expect(Token::Word(Word::Then))?;
        if condition {
            return self.branch_target(lexer);
        }
        // Skip to this IF's ELSE, honoring nested IFs, or give up on
        // the line.
        let mut depth = 0usize;
        loop {
            match lexer.next()? {
                Token::End => return Ok(Flow::Next),
                Token::Word(Word::If) => depth += 1,
                Token::Word(Word::Else) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
        self.branch_target(lexer)
    }

    /// A THEN or ELSE arm is either a bare line number (GOTO
    /// shorthand) or an inline statement list; an empty arm is a
    /// syntax error.
    fn branch_target(&mut self, lexer: &mut Lexer) -> Result<Flow> {
        match lexer.peek()? {
            Token::Number(_) => {
                let target = self.take_line_number(lexer)?;
                Ok(Flow::Jump(target))
            }
            Token::End | Token::Colon | Token::Word(Word::Else) => {
                Err(error!(Syntax; "EXPECTED STATEMENT"))
            }
            _ => Ok(Flow::Continue),
        }
    }

    fn for_header(
        &mut self,
        lexer: &mut Lexer,
        position: &Position,
        console: &mut dyn Console,
    ) -> Result<Flow> {
        let var = match lexer.next()? {
            Token::Ident(name) => {
                if name.ends_with('$') {
                    return Err(error!(TypeMismatch; "FOR NEEDS A NUMERIC VARIABLE"));
                }
                Rc::<str>::from(name.as_str())
            }
            _ => return Err(error!(Syntax; "EXPECTED VARIABLE")),
        };
        lexer.expect(Token::Operator(Operator::Equal))?;
        let start = self.eval(lexer, console)?.number()?;
        lexer.expect(Token::Word(Word::To))?;
        let limit = self.eval(lexer, console)?.number()?;
        let step = if *lexer.peek()? == Token::Word(Word::Step) {
            lexer.next()?;
            self.eval(lexer, console)?.number()?
        } else {
            1.0
        };
        self.vars.store(&var, Val::Number(start))?;
        self.push_frame(Frame::For {
            var,
            limit,
            step,
            body: Position {
                line: position.line,
                text: position.text.clone(),
                offset: lexer.offset(),
            },
        })?;
        Ok(Flow::Continue)
    }

    fn for_next(&mut self, lexer: &mut Lexer) -> Result<Flow> {
        let named = match lexer.peek()? {
            Token::Ident(name) => Some(name.as_str().to_string()),
            _ => None,
        };
        if named.is_some() {
            lexer.next()?;
        }
        let heap = self.heap.clone();
        match self.loops.last() {
            Some(Frame::For {
                var,
                limit,
                step,
                body,
            }) => {
                if let Some(named) = &named {
                    if named.as_str() != &**var {
                        return Err(error!(NextWithoutFor));
                    }
                }
                let next = self.vars.fetch(&heap, var)?.number()? + step;
                let keep_going = if *step >= 0.0 {
                    next <= *limit
                } else {
                    next >= *limit
                };
                if keep_going {
                    let var = var.clone();
                    let body = body.clone();
                    self.vars.store(&var, Val::Number(next))?;
                    Ok(Flow::Resume(body))
                } else {
                    let var = var.clone();
                    self.loops.pop();
                    // The counter goes out of scope with its loop.
                    self.vars.remove(&var);
                    Ok(Flow::Continue)
                }
            }
            _ => Err(error!(NextWithoutFor)),
        }
    }

    fn while_header(
        &mut self,
        lexer: &mut Lexer,
        position: &Position,
        statement_start: usize,
        console: &mut dyn Console,
    ) -> Result<Flow> {
        let condition = self.eval(lexer, console)?.number()? != 0.0;
        if condition {
            self.push_frame(Frame::While {
                header: Position {
                    line: position.line,
                    text: position.text.clone(),
                    offset: statement_start,
                },
            })?;
            return Ok(Flow::Continue);
        }
        self.skip_past_wend(lexer, position)
    }

    fn wend(&mut self) -> Result<Flow> {
        match self.loops.last() {
            Some(Frame::While { header }) => {
                let header = header.clone();
                self.loops.pop();
                // The WHILE re-evaluates its condition and pushes a
                // fresh frame if the loop continues.
                Ok(Flow::Resume(header))
            }
            _ => Err(error!(WendWithoutWhile)),
        }
    }

    /// Locate the WEND matching an unsatisfied WHILE by scanning
    /// forward, first through the rest of this line, then through
    /// following stored lines, counting nested WHILE/WEND pairs.
    fn skip_past_wend(&mut self, lexer: &mut Lexer, position: &Position) -> Result<Flow> {
        let mut depth = 1usize;
        loop {
            match lexer.next()? {
                Token::End => break,
                Token::Word(Word::While) => depth += 1,
                Token::Word(Word::Wend) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Flow::Resume(Position {
                            line: position.line,
                            text: position.text.clone(),
                            offset: lexer.offset(),
                        }));
                    }
                }
                _ => {}
            }
        }
        let heap = self.heap.clone();
        let mut current = match position.line {
            Some(number) => number,
            None => return Err(error!(WhileWithoutWend)),
        };
        while let Some((number, text)) = self.program.next_after(current) {
            let mut scan = Lexer::new(&heap, &text);
            loop {
                match scan.next()? {
                    Token::End => break,
                    Token::Word(Word::While) => depth += 1,
                    Token::Word(Word::Wend) => {
                        depth -= 1;
                        if depth == 0 {
                            return Ok(Flow::Resume(Position {
                                line: Some(number),
                                text: text.clone(),
                                offset: scan.offset(),
                            }));
                        }
                    }
                    _ => {}
                }
            }
            current = number;
        }
        Err(error!(WhileWithoutWend))
    }

    fn repeat_header(&mut self, lexer: &mut Lexer, position: &Position) -> Result<Flow> {
        self.push_frame(Frame::Repeat {
            body: Position {
                line: position.line,
                text: position.text.clone(),
                offset: lexer.offset(),
            },
        })?;
        Ok(Flow::Continue)
    }

    fn until(&mut self, lexer: &mut Lexer, console: &mut dyn Console) -> Result<Flow> {
        let done = self.eval(lexer, console)?.number()? != 0.0;
        match self.loops.last() {
            Some(Frame::Repeat { body }) => {
                if done {
                    self.loops.pop();
                    Ok(Flow::Continue)
                } else {
                    Ok(Flow::Resume(body.clone()))
                }
            }
            _ => Err(error!(UntilWithoutRepeat)),
        }
    }

    /// DO/LOOP is the REPEAT family: bare LOOP repeats forever,
    /// `LOOP UNTIL cond` behaves exactly like UNTIL.
    fn repeat_loop(&mut self, lexer: &mut Lexer, console: &mut dyn Console) -> Result<Flow> {
        if *lexer.peek()? == Token::Word(Word::Until) {
            lexer.next()?;
            return self.until(lexer, console);
        }
        match self.loops.last() {
            Some(Frame::Repeat { body }) => Ok(Flow::Resume(body.clone())),
            _ => Err(error!(UntilWithoutRepeat; "LOOP WITHOUT DO")),
        }
    }

    fn push_frame(&mut self, frame: Frame) -> Result<()> {
        if self.loops.len() >= MAX_DEPTH {
            return Err(error!(OutOfMemory; "TOO MANY NESTED LOOPS"));
        }
        self.loops.push(frame);
        Ok(())
    }

    fn poke(&mut self, lexer: &mut Lexer, console: &mut dyn Console) -> Result<Flow> {
        let addr = self.eval(lexer, console)?.index()?;
        lexer.expect(Token::Comma)?;
        let value = self.eval(lexer, console)?.index()?;
        if addr == BACKGROUND_REGISTER {
            console.set_background(value as u8);
        } else {
            console.poke(addr, value as u8);
        }
        Ok(Flow::Continue)
    }

    fn plot(&mut self, lexer: &mut Lexer, console: &mut dyn Console) -> Result<Flow> {
        let x = self.eval(lexer, console)?.index()?;
        lexer.expect(Token::Comma)?;
        let y = self.eval(lexer, console)?.index()?;
        let ch = self.plot_char(lexer, console)?;
        console.plot(x, y, ch);
        Ok(Flow::Continue)
    }

    /// DRAW x1,y1 TO x2,y2 [,char] rasterizes a line of character
    /// cells onto the screen grid.
    fn draw(&mut self, lexer: &mut Lexer, console: &mut dyn Console) -> Result<Flow> {
        let x1 = self.eval(lexer, console)?.index()?;
        lexer.expect(Token::Comma)?;
        let y1 = self.eval(lexer, console)?.index()?;
        lexer.expect(Token::Word(Word::To))?;
        let x2 = self.eval(lexer, console)?.index()?;
        lexer.expect(Token::Comma)?;
        let y2 = self.eval(lexer, console)?.index()?;
        let ch = self.plot_char(lexer, console)?;
        // Endpoints clamp to the screen grid, which also bounds the
        // raster loop.
        let (x1, y1) = clamp_cell(x1, y1);
        let (x2, y2) = clamp_cell(x2, y2);
        let dx = (x2 - x1).abs();
        let dy = -(y2 - y1).abs();
        let sx = if x1 < x2 { 1 } else { -1 };
        let sy = if y1 < y2 { 1 } else { -1 };
        let (mut x, mut y) = (x1, y1);
        let mut err = dx + dy;
        loop {
            console.plot(x, y, ch);
            if x == x2 && y == y2 {
                break;
            }
            let doubled = 2 * err;
            if doubled >= dy {
                err += dy;
                x += sx;
            }
            if doubled <= dx {
                err += dx;
                y += sy;
            }
        }
        Ok(Flow::Continue)
    }

    fn plot_char(&mut self, lexer: &mut Lexer, console: &mut dyn Console) -> Result<char> {
        if *lexer.peek()? != Token::Comma {
            return Ok('*');
        }
        lexer.next()?;
        match self.eval(lexer, console)? {
            Val::Number(code) => {
                let code = code.trunc();
                if !(0.0..=255.0).contains(&code) {
                    return Err(error!(IllegalQuantity));
                }
                Ok(char::from(code as u8))
            }
            Val::String(s) => s
                .chars()
                .next()
                .ok_or_else(|| error!(IllegalQuantity)),
        }
    }
}

fn clamp_cell(x: i64, y: i64) -> (i64, i64) {
    (x.clamp(0, SCREEN_COLS - 1), y.clamp(0, SCREEN_ROWS - 1))
}
