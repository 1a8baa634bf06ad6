//! Resolved form model that value extraction reads from.
//!
//! Pages describe their inputs as a flat list of [`ControlDescriptor`]s. Override
//! groups are linked to the control they supersede while the form is built, so
//! extraction only follows [`Control::override_group`].

use shared::form::{ControlDescriptor, ControlKind, FormDescription};

/// Mutually exclusive options, at most one of them selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceGroup {
    options: Vec<String>,
    selected: Option<usize>,
}

impl ChoiceGroup {
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            selected: None,
        }
    }

    pub fn with_selected(mut self, value: &str) -> Self {
        self.select(value);
        self
    }

    /// Selects the first option equal to `value`; returns false if there is none.
    pub fn select(&mut self, value: &str) -> bool {
        match self.options.iter().position(|option| option == value) {
            Some(index) => {
                self.selected = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_value(&self) -> Option<&str> {
        self.selected
            .and_then(|index| self.options.get(index))
            .map(String::as_str)
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    fn push_option(&mut self, value: String, checked: bool) {
        self.options.push(value);
        if checked && self.selected.is_none() {
            self.selected = Some(self.options.len() - 1);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlInput {
    /// Raw slider text, parsed as a number on extraction.
    Range(String),
    Toggle(bool),
    /// Raw color text, normally `#rrggbb`.
    Color(String),
    Choice(ChoiceGroup),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub name: String,
    pub base: Option<ControlInput>,
    pub override_group: Option<ChoiceGroup>,
}

impl Control {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base: None,
            override_group: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    id: String,
    controls: Vec<Control>,
}

impl Form {
    pub fn builder(id: impl Into<String>) -> FormBuilder {
        FormBuilder {
            form: Self {
                id: id.into(),
                controls: Vec::new(),
            },
        }
    }

    /// Builds a form from raw page inputs. The first input of a name wins, except
    /// for radio buttons which accumulate into one group.
    pub fn from_description(description: &FormDescription) -> Self {
        let mut form = Self {
            id: description.id.clone(),
            controls: Vec::new(),
        };
        for descriptor in &description.controls {
            form.add_descriptor(descriptor);
        }
        form
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls.iter().find(|control| control.name == name)
    }

    pub fn control_mut(&mut self, name: &str) -> Option<&mut Control> {
        self.controls.iter_mut().find(|control| control.name == name)
    }

    fn entry(&mut self, name: &str) -> &mut Control {
        let index = match self.controls.iter().position(|control| control.name == name) {
            Some(index) => index,
            None => {
                self.controls.push(Control::empty(name));
                self.controls.len() - 1
            }
        };
        &mut self.controls[index]
    }

    fn add_descriptor(&mut self, descriptor: &ControlDescriptor) {
        if let Some(target) = descriptor.overridden_control() {
            self.entry(target)
                .override_group
                .get_or_insert_with(ChoiceGroup::default)
                .push_option(descriptor.value.clone(), descriptor.checked);
            return;
        }

        let control = self.entry(&descriptor.name);
        match &mut control.base {
            Some(ControlInput::Choice(group)) if descriptor.kind == ControlKind::Radio => {
                group.push_option(descriptor.value.clone(), descriptor.checked);
            }
            Some(_) => {}
            None => control.base = Some(input_from(descriptor)),
        }
    }
}

fn input_from(descriptor: &ControlDescriptor) -> ControlInput {
    match descriptor.kind {
        ControlKind::Range => ControlInput::Range(descriptor.value.clone()),
        ControlKind::Checkbox => ControlInput::Toggle(descriptor.checked),
        ControlKind::Color => ControlInput::Color(descriptor.value.clone()),
        ControlKind::Radio => {
            let mut group = ChoiceGroup::default();
            group.push_option(descriptor.value.clone(), descriptor.checked);
            ControlInput::Choice(group)
        }
        ControlKind::Text | ControlKind::Other => ControlInput::Text(descriptor.value.clone()),
    }
}

pub struct FormBuilder {
    form: Form,
}

impl FormBuilder {
    pub fn range(self, name: &str, value: impl Into<String>) -> Self {
        self.input(name, ControlInput::Range(value.into()))
    }

    pub fn toggle(self, name: &str, checked: bool) -> Self {
        self.input(name, ControlInput::Toggle(checked))
    }

    pub fn color(self, name: &str, value: impl Into<String>) -> Self {
        self.input(name, ControlInput::Color(value.into()))
    }

    pub fn choice(self, name: &str, group: ChoiceGroup) -> Self {
        self.input(name, ControlInput::Choice(group))
    }

    pub fn text(self, name: &str, value: impl Into<String>) -> Self {
        self.input(name, ControlInput::Text(value.into()))
    }

    /// Attaches an override group to `name`, creating a base-less control if needed.
    pub fn override_group(mut self, name: &str, group: ChoiceGroup) -> Self {
        self.form.entry(name).override_group = Some(group);
        self
    }

    pub fn build(self) -> Form {
        self.form
    }

    fn input(mut self, name: &str, input: ControlInput) -> Self {
        self.form.entry(name).base = Some(input);
        self
    }
}
